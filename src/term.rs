//! Elixir Term Conversion Utilities
//!
//! Converts annotated documents and line tables to Elixir terms.

use rustler::{Encoder, Env, NewBinary, Term};

use crate::dom::{NodeId, NodeKind, XmlDocument};
use crate::error::Error;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    element,
    comment,
    pi,
}

/// `{:ok, root_term}` for an annotated document
pub fn document_to_term<'a>(env: Env<'a>, doc: &XmlDocument) -> Term<'a> {
    let root = node_to_term(env, doc, XmlDocument::DOCUMENT);
    (ok(), root).encode(env)
}

/// `{:error, message}`
pub fn error_to_term<'a>(env: Env<'a>, err: &Error) -> Term<'a> {
    (error(), str_to_binary(env, &err.to_string())).encode(env)
}

/// Convert a node to an Elixir term
///
/// Elements become `{:element, name, attrs, children, line}` where `line` is
/// the start-tag line, or nil if the document was never annotated. Built
/// bottom-up with an explicit stack, so nesting depth cannot overflow the
/// native stack.
pub fn node_to_term<'a>(env: Env<'a>, doc: &XmlDocument, node_id: NodeId) -> Term<'a> {
    let nil = rustler::types::atom::nil().encode(env);

    // The document node stands for its root element
    let start = match doc.get_node(node_id).map(|n| n.kind) {
        Some(NodeKind::Document) => doc.root_element_id(),
        Some(_) => Some(node_id),
        None => None,
    };
    let Some(start) = start else {
        return nil;
    };

    doc.fold_subtree(
        start,
        |id| leaf_to_term(env, doc, id),
        |id, children| {
            // Prepend from the back so the list keeps document order
            let mut list = Term::list_new_empty(env);
            for child in children.rev() {
                list = list.list_prepend(child);
            }
            element_to_term(env, doc, id, list)
        },
    )
    .unwrap_or(nil)
}

fn element_to_term<'a>(env: Env<'a>, doc: &XmlDocument, id: NodeId, children: Term<'a>) -> Term<'a> {
    let name = doc.name_lossy(id).unwrap_or_default();
    let name_term = str_to_binary(env, &name);

    let mut attrs = Term::list_new_empty(env);
    for attr in doc.attributes(id).iter().rev() {
        let attr_name = doc.strings.get(attr.name_id).unwrap_or_default();
        let attr_value = doc.strings.get(attr.value_id).unwrap_or_default();
        let attr_tuple = (bytes_to_binary(env, attr_name), bytes_to_binary(env, attr_value));
        attrs = attrs.list_prepend(attr_tuple.encode(env));
    }

    let line = doc.line(id);
    (element(), name_term, attrs, children, line).encode(env)
}

fn leaf_to_term<'a>(env: Env<'a>, doc: &XmlDocument, id: NodeId) -> Term<'a> {
    let Some(node) = doc.get_node(id) else {
        return rustler::types::atom::nil().encode(env);
    };
    match node.kind {
        NodeKind::Text | NodeKind::CData => {
            bytes_to_binary(env, doc.strings.get(node.name_id).unwrap_or_default())
        }
        NodeKind::Comment => {
            let content = doc.strings.get(node.name_id).unwrap_or_default();
            (comment(), bytes_to_binary(env, content)).encode(env)
        }
        NodeKind::ProcessingInstruction => {
            let target = doc.strings.get(node.name_id).unwrap_or_default();
            (pi(), bytes_to_binary(env, target)).encode(env)
        }
        NodeKind::Element | NodeKind::Document => rustler::types::atom::nil().encode(env),
    }
}

/// `[{name, line}]` in element pre-order
pub fn element_lines_to_term<'a, S: AsRef<str>>(env: Env<'a>, lines: &[(S, u32)]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for (name, line) in lines.iter().rev() {
        let pair = (str_to_binary(env, name.as_ref()), *line);
        list = list.list_prepend(pair.encode(env));
    }
    list
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    bytes_to_binary(env, s.as_bytes())
}

/// Create a binary from bytes
fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
