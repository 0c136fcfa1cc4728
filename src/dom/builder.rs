//! Tree Builder
//!
//! `ScanHandler` that assembles an `XmlDocument` from scan events.
//!
//! Lenient mode accepts whatever the scanner produces: stray end tags are
//! ignored and unclosed elements are closed at end of input. Strict mode
//! stops at the first structural error and reports it from `finish()`.

use super::document::XmlDocument;
use super::node::{NodeId, NodeKind};
use crate::core::{ScanHandler, Span};
use crate::error::ParseError;

/// Builds an owned document from events over `input`
pub struct TreeBuilder<'a> {
    input: &'a [u8],
    doc: XmlDocument,
    /// Open elements, innermost last
    stack: Vec<NodeId>,
    strict: bool,
    seen_root_element: bool,
    error: Option<ParseError>,
}

impl<'a> TreeBuilder<'a> {
    /// Lenient builder
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_mode(input, false)
    }

    /// Builder that rejects malformed structure
    pub fn new_strict(input: &'a [u8]) -> Self {
        Self::with_mode(input, true)
    }

    fn with_mode(input: &'a [u8], strict: bool) -> Self {
        TreeBuilder {
            input,
            doc: XmlDocument::new(),
            stack: Vec::with_capacity(32),
            strict,
            seen_root_element: false,
            error: None,
        }
    }

    /// Error that stopped a strict build, if any
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Take the finished document
    pub fn finish(self) -> Result<XmlDocument, ParseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.doc),
        }
    }

    #[inline]
    fn parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(XmlDocument::DOCUMENT)
    }

    #[inline]
    fn at_document_level(&self) -> bool {
        self.stack.is_empty()
    }

    /// Record the first error; later events are ignored
    fn fail(&mut self, message: String, position: u32) {
        if self.error.is_none() {
            tracing::debug!(%message, position, "strict build failed");
            self.error = Some(ParseError::new(message, position as usize));
        }
    }

    fn name_of(&self, span: Span) -> String {
        String::from_utf8_lossy(span.slice(self.input)).into_owned()
    }

    fn find_duplicate_attribute(&self, attrs: &[(Span, Span)]) -> Option<Span> {
        for (i, (name, _)) in attrs.iter().enumerate() {
            let bytes = name.slice(self.input);
            if attrs[i + 1..].iter().any(|(other, _)| other.slice(self.input) == bytes) {
                return Some(*name);
            }
        }
        None
    }

    fn character_data(&mut self, kind: NodeKind, span: Span) {
        let parent = self.parent();
        self.doc.append_character_data(parent, kind, span.slice(self.input));
    }
}

impl ScanHandler for TreeBuilder<'_> {
    fn start_element(&mut self, name: Span, attrs: &[(Span, Span)], is_empty: bool) {
        if self.error.is_some() {
            return;
        }

        if self.strict {
            if self.at_document_level() && self.seen_root_element {
                self.fail("Document has multiple root elements".to_string(), name.offset);
                return;
            }
            if let Some(dup) = self.find_duplicate_attribute(attrs) {
                let message = format!("Duplicate attribute: {}", self.name_of(dup));
                self.fail(message, dup.offset);
                return;
            }
        }
        if self.at_document_level() {
            self.seen_root_element = true;
        }

        let parent = self.parent();
        let id = self.doc.append_element_bytes(parent, name.slice(self.input));
        for (attr_name, attr_value) in attrs {
            self.doc
                .push_attribute(id, attr_name.slice(self.input), attr_value.slice(self.input));
        }

        if !is_empty {
            self.stack.push(id);
        }
    }

    fn end_element(&mut self, name: Span) {
        if self.error.is_some() {
            return;
        }

        let Some(&open) = self.stack.last() else {
            if self.strict {
                let message = format!("Unexpected end tag: </{}> without matching start tag", self.name_of(name));
                self.fail(message, name.offset);
            }
            return;
        };

        if self.strict {
            let open_name = self
                .doc
                .get_node(open)
                .and_then(|n| self.doc.strings.get(n.name_id))
                .unwrap_or_default();
            if open_name != name.slice(self.input) {
                let message = format!(
                    "Tag mismatch: <{}> closed with </{}>",
                    String::from_utf8_lossy(open_name),
                    self.name_of(name)
                );
                self.fail(message, name.offset);
                return;
            }
        }

        self.stack.pop();
    }

    fn text(&mut self, span: Span, _needs_entity_decode: bool) {
        if self.error.is_some() {
            return;
        }
        if self.strict && self.at_document_level() {
            let is_whitespace = span
                .slice(self.input)
                .iter()
                .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
            if !is_whitespace {
                self.fail("Text content not allowed at document level".to_string(), span.offset);
            }
            return;
        }
        // Whitespace between top-level constructs is not kept
        if self.at_document_level() {
            return;
        }
        self.character_data(NodeKind::Text, span);
    }

    fn cdata(&mut self, span: Span) {
        if self.error.is_some() {
            return;
        }
        if self.strict && self.at_document_level() {
            self.fail("CDATA section not allowed at document level".to_string(), span.offset);
            return;
        }
        self.character_data(NodeKind::CData, span);
    }

    fn comment(&mut self, span: Span) {
        if self.error.is_some() {
            return;
        }
        self.character_data(NodeKind::Comment, span);
    }

    fn processing_instruction(&mut self, target: Span, _data: Option<Span>) {
        if self.error.is_some() {
            return;
        }
        let parent = self.parent();
        self.doc
            .append_processing_instruction(parent, target.slice(self.input));
    }

    fn end_document(&mut self) {
        if self.error.is_some() {
            return;
        }
        if self.strict {
            if let Some(&unclosed) = self.stack.first() {
                let name = self.doc.name_lossy(unclosed).unwrap_or_default().into_owned();
                let end = u32::try_from(self.input.len()).unwrap_or(u32::MAX);
                self.fail(format!("Unclosed tag: <{}>", name), end);
            }
        }
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnifiedScanner;
    use pretty_assertions::assert_eq;

    fn build(input: &[u8]) -> XmlDocument {
        let mut builder = TreeBuilder::new(input);
        UnifiedScanner::new(input).scan(&mut builder);
        builder.finish().unwrap()
    }

    fn build_strict(input: &[u8]) -> Result<XmlDocument, ParseError> {
        let mut builder = TreeBuilder::new_strict(input);
        UnifiedScanner::new(input).scan(&mut builder);
        builder.finish()
    }

    fn element_names(doc: &XmlDocument) -> Vec<&str> {
        doc.elements().filter_map(|id| doc.node_name(id)).collect()
    }

    #[test]
    fn test_build_simple() {
        let doc = build(b"<root>hello</root>");
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("root"));
        let text = doc.children(root).next().unwrap();
        assert_eq!(doc.text_content(text), Some("hello"));
    }

    #[test]
    fn test_build_nested_with_attributes() {
        let doc = build(br#"<a x="1"><b/><c y='2' z="3"><d/></c></a>"#);
        assert_eq!(element_names(&doc), vec!["a", "b", "c", "d"]);

        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.get_attribute(root, "x"), Some("1"));
        let c = doc.children(root).nth(1).unwrap();
        assert_eq!(doc.get_attribute_values(c), vec![("y", "2"), ("z", "3")]);
    }

    #[test]
    fn test_text_kept_raw() {
        let doc = build(b"<a>x &amp; y</a>");
        let root = doc.root_element_id().unwrap();
        let text = doc.children(root).next().unwrap();
        assert_eq!(doc.text_content(text), Some("x &amp; y"));
    }

    #[test]
    fn test_prolog_and_misc() {
        let doc = build(b"<?xml version=\"1.0\"?>\n<!DOCTYPE a>\n<!-- c -->\n<a><?pi data?><![CDATA[<x>]]></a>\n");
        let root = doc.root_element_id().unwrap();
        // comment is the only non-whitespace node before the root
        assert_eq!(doc.children(XmlDocument::DOCUMENT).count(), 2);
        let kids: Vec<_> = doc.children(root).collect();
        assert_eq!(doc.node_name(kids[0]), Some("pi"));
        assert_eq!(doc.text_content(kids[1]), Some("<x>"));
    }

    #[test]
    fn test_lenient_tolerates_bad_structure() {
        let doc = build(b"</stray><a><b></a>");
        assert_eq!(element_names(&doc), vec!["a", "b"]);

        let doc = build(b"<a/><b/>");
        assert_eq!(element_names(&doc), vec!["a", "b"]);
    }

    #[test]
    fn test_strict_accepts_well_formed() {
        let doc = build_strict(b"<?xml version=\"1.0\"?>\n<a>\n  <b/>\n</a>\n").unwrap();
        assert_eq!(element_names(&doc), vec!["a", "b"]);
    }

    #[test]
    fn test_strict_tag_mismatch() {
        let err = build_strict(b"<a><b></a></b>").unwrap_err();
        assert_eq!(err.message, "Tag mismatch: <b> closed with </a>");
        assert_eq!(err.position, 8);
    }

    #[test]
    fn test_strict_unexpected_end_tag() {
        let err = build_strict(b"<a/></b>").unwrap_err();
        assert_eq!(err.message, "Unexpected end tag: </b> without matching start tag");
    }

    #[test]
    fn test_strict_unclosed_tag() {
        let err = build_strict(b"<a><b></b>").unwrap_err();
        assert_eq!(err.message, "Unclosed tag: <a>");
        assert_eq!(err.position, 10);
    }

    #[test]
    fn test_strict_multiple_roots() {
        let err = build_strict(b"<a/>\n<b/>").unwrap_err();
        assert_eq!(err.message, "Document has multiple root elements");
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_strict_document_level_content() {
        let err = build_strict(b"junk<a/>").unwrap_err();
        assert_eq!(err.message, "Text content not allowed at document level");

        let err = build_strict(b"<a/><![CDATA[x]]>").unwrap_err();
        assert_eq!(err.message, "CDATA section not allowed at document level");
    }

    #[test]
    fn test_strict_duplicate_attribute() {
        let err = build_strict(br#"<a x="1" x="2"/>"#).unwrap_err();
        assert_eq!(err.message, "Duplicate attribute: x");
    }

    #[test]
    fn test_first_error_wins() {
        let input = b"<a></b></c>";
        let mut builder = TreeBuilder::new_strict(input);
        UnifiedScanner::new(input).scan(&mut builder);
        assert_eq!(
            builder.error().map(|e| e.message.as_str()),
            Some("Tag mismatch: <a> closed with </b>")
        );
    }
}
