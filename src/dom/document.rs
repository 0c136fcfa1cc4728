//! XML Document - Arena-based DOM representation
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes
//! - NodeId indices for traversal
//! - String interning for names and character data
//! - Per-element source line, filled in by annotation

use std::borrow::Cow;

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use crate::position::ElementTree;

/// An XML document stored in arena format
///
/// Node 0 is always the document node. The document owns all of its
/// strings, so it outlives the input it was built from.
#[derive(Debug)]
pub struct XmlDocument {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Arena of attributes
    attributes: Vec<XmlAttribute>,
    /// Interned strings
    pub strings: StringPool,
    /// First element appended under the document node
    root_element: Option<NodeId>,
    /// Most recently appended element; the only one still taking attributes
    attr_owner: Option<NodeId>,
}

impl XmlDocument {
    /// ID of the document node
    pub const DOCUMENT: NodeId = 0;

    /// Create a document holding only the document node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(XmlNode::document());
        XmlDocument {
            nodes,
            attributes: Vec::new(),
            strings: StringPool::new(),
            root_element: None,
            attr_owner: None,
        }
    }

    fn child_depth(&self, parent: NodeId) -> u32 {
        self.get_node(parent).map_or(0, |n| n.depth.saturating_add(1))
    }

    fn push_node(&mut self, parent: NodeId, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent, id);
        id
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let Some(last_child_opt) = self.get_node(parent_id).map(|n| n.last_child) else {
            return;
        };

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    /// Append an element named `name` as the last child of `parent`
    pub fn append_element_bytes(&mut self, parent: NodeId, name: &[u8]) -> NodeId {
        let name_id = self.strings.intern(name);
        let mut node = XmlNode::element(name_id, Some(parent), self.child_depth(parent));
        node.attr_start = self.attributes.len() as u32;
        let id = self.push_node(parent, node);
        self.attr_owner = Some(id);
        if parent == Self::DOCUMENT && self.root_element.is_none() {
            self.root_element = Some(id);
        }
        id
    }

    /// Append an element named `name` as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.append_element_bytes(parent, name.as_bytes())
    }

    /// Add an attribute to `element`.
    ///
    /// Attributes are stored contiguously, so they must be added right after
    /// the element is appended and before any other element. Returns false
    /// if that does not hold.
    pub fn push_attribute(&mut self, element: NodeId, name: &[u8], value: &[u8]) -> bool {
        if self.attr_owner != Some(element) {
            return false;
        }
        let name_id = self.strings.intern(name);
        let value_id = self.strings.intern(value);
        self.attributes.push(XmlAttribute { name_id, value_id });
        self.nodes[element as usize].attr_count += 1;
        true
    }

    /// Append a text, CDATA or comment node under `parent`
    pub fn append_character_data(&mut self, parent: NodeId, kind: NodeKind, content: &[u8]) -> NodeId {
        let content_id = self.strings.intern(content);
        let node = XmlNode::character_data(kind, content_id, Some(parent), self.child_depth(parent));
        self.push_node(parent, node)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_character_data(parent, NodeKind::Text, text.as_bytes())
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append_character_data(parent, NodeKind::Comment, text.as_bytes())
    }

    /// Append a processing instruction node (target only)
    pub fn append_processing_instruction(&mut self, parent: NodeId, target: &[u8]) -> NodeId {
        let target_id = self.strings.intern(target);
        let node = XmlNode::processing_instruction(target_id, Some(parent), self.child_depth(parent));
        self.push_node(parent, node)
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get_node(id).is_some_and(XmlNode::is_element)
    }

    /// Get node name as string
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Element or PI name, with invalid UTF-8 replaced
    pub fn name_lossy(&self, id: NodeId) -> Option<Cow<'_, str>> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => {
                self.strings.get(node.name_id).map(String::from_utf8_lossy)
            }
            _ => None,
        }
    }

    /// Get content of a text, CDATA or comment node
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => {
                self.strings.get_str(node.name_id) // content ID lives in name_id
            }
            _ => None,
        }
    }

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        self.get_node(id)
            .and_then(|node| {
                let start = node.attr_start as usize;
                self.attributes.get(start..start + node.attr_count as usize)
            })
            .unwrap_or(&[])
    }

    /// Get attribute value by name
    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.attributes(node_id)
            .iter()
            .find(|attr| self.strings.get_str(attr.name_id) == Some(name))
            .and_then(|attr| self.strings.get_str(attr.value_id))
    }

    /// Get all attribute names and values for a node
    pub fn get_attribute_values(&self, node_id: NodeId) -> Vec<(&str, &str)> {
        self.attributes(node_id)
            .iter()
            .filter_map(|attr| {
                let name = self.strings.get_str(attr.name_id)?;
                let value = self.strings.get_str(attr.value_id)?;
                Some((name, value))
            })
            .collect()
    }

    /// Source line of an element's start tag, once annotated
    pub fn line(&self, id: NodeId) -> Option<u32> {
        self.get_node(id).and_then(|n| n.line)
    }

    /// Drop every attached line so the tree can be annotated again
    pub fn clear_lines(&mut self) {
        for node in &mut self.nodes {
            node.line = None;
        }
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Iterate over all descendants of a node (pre-order)
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut iter = DescendantIter {
            doc: self,
            stack: Vec::new(),
        };
        iter.push_children(id);
        iter
    }

    /// All elements of the document in pre-order
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(Self::DOCUMENT).filter(|&id| self.is_element(id))
    }

    /// Build a value for the subtree of `root` from the leaves up.
    ///
    /// `leaf` maps a node without element structure (text, comment, ...);
    /// `element` receives an element and its children's values in document
    /// order. Uses an explicit stack, so depth is bounded only by memory.
    pub fn fold_subtree<T, L, E>(&self, root: NodeId, mut leaf: L, mut element: E) -> Option<T>
    where
        L: FnMut(NodeId) -> T,
        E: FnMut(NodeId, std::vec::Drain<'_, T>) -> T,
    {
        enum Frame {
            Enter(NodeId),
            Close(NodeId, usize),
        }

        self.get_node(root)?;
        let mut frames = vec![Frame::Enter(root)];
        let mut done: Vec<T> = Vec::new();

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(id) => {
                    let Some(node) = self.get_node(id) else {
                        continue;
                    };
                    if !node.is_element() {
                        done.push(leaf(id));
                        continue;
                    }
                    let close_at = frames.len();
                    frames.push(Frame::Close(id, 0));
                    // Reverse push so the first child is finished first
                    let mut count = 0;
                    let mut child_id = node.last_child;
                    while let Some(cid) = child_id {
                        frames.push(Frame::Enter(cid));
                        count += 1;
                        child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
                    }
                    frames[close_at] = Frame::Close(id, count);
                }
                Frame::Close(id, count) => {
                    let start = done.len().saturating_sub(count);
                    let value = element(id, done.drain(start..));
                    done.push(value);
                }
            }
        }

        done.pop()
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree for XmlDocument {
    type Node = NodeId;

    fn is_element(&self, node: NodeId) -> bool {
        XmlDocument::is_element(self, node)
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.first_child
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.next_sibling
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.prev_sibling
    }

    fn attach_line(&mut self, node: NodeId, line: u32) -> bool {
        match self.nodes.get_mut(node as usize) {
            Some(n) if n.is_element() && n.line.is_none() => {
                n.line = Some(line);
                true
            }
            _ => false,
        }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first)
pub struct DescendantIter<'d> {
    doc: &'d XmlDocument,
    stack: Vec<NodeId>,
}

impl DescendantIter<'_> {
    /// Push children in reverse so the first child pops first
    fn push_children(&mut self, id: NodeId) {
        let mut child_id = self.doc.get_node(id).and_then(|n| n.last_child);
        while let Some(cid) = child_id {
            self.stack.push(cid);
            child_id = self.doc.get_node(cid).and_then(|n| n.prev_sibling);
        }
    }
}

impl Iterator for DescendantIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.push_children(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_nested() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        let a = doc.append_element(root, "a");
        let b = doc.append_element(root, "b");
        let c = doc.append_element(b, "c");

        assert_eq!(doc.root_element_id(), Some(root));
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.descendants(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(doc.get_node(c).map(|n| n.depth), Some(3));
        assert_eq!(doc.node_name(c), Some("c"));
    }

    #[test]
    fn test_siblings() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        for name in ["a", "b", "c"] {
            doc.append_element(root, name);
        }
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 3);

        let first = doc.get_node(children[0]).unwrap();
        assert!(first.prev_sibling.is_none());
        assert_eq!(first.next_sibling, Some(children[1]));
    }

    #[test]
    fn test_attributes() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        assert!(doc.push_attribute(root, b"id", b"1"));
        assert!(doc.push_attribute(root, b"class", b"x"));
        let child = doc.append_element(root, "child");

        // root's attribute run is closed once another element is appended
        assert!(!doc.push_attribute(root, b"late", b"v"));
        assert_eq!(doc.get_attribute(root, "class"), Some("x"));
        assert_eq!(doc.get_attribute_values(root), vec![("id", "1"), ("class", "x")]);
        assert!(doc.attributes(child).is_empty());
    }

    #[test]
    fn test_attributes_only_on_last_element() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        let first = doc.append_element(root, "first");
        let second = doc.append_element(root, "second");

        // neither earlier element may extend the run that `second` now owns
        assert!(!doc.push_attribute(root, b"a", b"1"));
        assert!(!doc.push_attribute(first, b"b", b"2"));
        assert!(doc.push_attribute(second, b"c", b"3"));

        let text = doc.append_text(second, "t");
        assert!(!doc.push_attribute(text, b"d", b"4"));
        assert!(doc.attributes(root).is_empty());
        assert!(doc.attributes(first).is_empty());
        assert_eq!(doc.get_attribute_values(second), vec![("c", "3")]);
    }

    #[test]
    fn test_character_data() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        let text = doc.append_text(root, "hello");
        let cdata = doc.append_character_data(root, NodeKind::CData, b"<raw>");
        let pi = doc.append_processing_instruction(root, b"target");

        assert_eq!(doc.text_content(text), Some("hello"));
        assert_eq!(doc.text_content(cdata), Some("<raw>"));
        assert_eq!(doc.text_content(root), None);
        assert_eq!(doc.node_name(pi), Some("target"));
        assert!(!doc.is_element(text));
    }

    #[test]
    fn test_elements_preorder() {
        let mut doc = XmlDocument::new();
        doc.append_comment(XmlDocument::DOCUMENT, "lead");
        let a = doc.append_element(XmlDocument::DOCUMENT, "a");
        let b = doc.append_element(a, "b");
        doc.append_text(b, "t");
        let c = doc.append_element(a, "c");
        assert_eq!(doc.elements().collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_attach_line_once() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "root");
        let text = doc.append_text(root, "x");

        assert!(doc.attach_line(root, 4));
        assert!(!doc.attach_line(root, 5));
        assert!(!doc.attach_line(text, 1));
        assert_eq!(doc.line(root), Some(4));
        assert_eq!(doc.get_node(root).and_then(|n| n.line), Some(4));

        doc.clear_lines();
        assert_eq!(doc.line(root), None);
        assert!(doc.attach_line(root, 6));
    }

    #[test]
    fn test_unknown_ids() {
        let doc = XmlDocument::new();
        assert!(doc.get_node(99).is_none());
        assert_eq!(doc.line(99), None);
        assert_eq!(doc.children(99).count(), 0);
        assert!(doc.attributes(99).is_empty());
        assert_eq!(doc.root_element_id(), None);
        assert!(doc.fold_subtree(99, |_| 0, |_, kids| kids.count()).is_none());
    }

    #[test]
    fn test_name_lossy() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element_bytes(XmlDocument::DOCUMENT, b"caf\xe9");
        let text = doc.append_text(root, "x");

        assert_eq!(doc.node_name(root), None);
        assert_eq!(doc.name_lossy(root).as_deref(), Some("caf\u{fffd}"));
        assert_eq!(doc.name_lossy(text), None);
    }

    /// Rebuild markup bottom-up, the way term conversion does
    fn render(doc: &XmlDocument, root: NodeId) -> Option<String> {
        doc.fold_subtree(
            root,
            |id| doc.text_content(id).unwrap_or("").to_string(),
            |id, children| {
                let name = doc.node_name(id).unwrap_or("");
                format!("<{}>{}</{}>", name, children.collect::<String>(), name)
            },
        )
    }

    #[test]
    fn test_fold_subtree_keeps_document_order() {
        let mut doc = XmlDocument::new();
        let a = doc.append_element(XmlDocument::DOCUMENT, "a");
        doc.append_text(a, "1");
        let b = doc.append_element(a, "b");
        doc.append_element(b, "c");
        doc.append_text(b, "2");
        doc.append_element(a, "d");
        doc.append_comment(a, "3");

        assert_eq!(
            render(&doc, a).as_deref(),
            Some("<a>1<b><c></c>2</b><d></d>3</a>")
        );
    }

    #[test]
    fn test_fold_subtree_deep_nesting() {
        let mut doc = XmlDocument::new();
        let root = doc.append_element(XmlDocument::DOCUMENT, "n");
        let mut parent = root;
        for _ in 1..200_000 {
            parent = doc.append_element(parent, "n");
        }
        doc.append_text(parent, "leaf");

        let depth = doc.fold_subtree(root, |_| 0usize, |_, children| children.max().unwrap_or(0) + 1);
        assert_eq!(depth, Some(200_000));
    }
}
