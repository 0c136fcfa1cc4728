//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for name (elements, PIs) or content (text, comments)
    pub name_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
    /// Depth in document tree
    pub depth: u32,
    /// Source line of the start tag; elements only, set by annotation
    pub line: Option<u32>,
}

impl XmlNode {
    fn with_kind(kind: NodeKind, name_id: u32, parent: Option<NodeId>, depth: u32) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            attr_start: 0,
            attr_count: 0,
            depth,
            line: None,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, 0, None, 0)
    }

    /// Create a new element node
    pub fn element(name_id: u32, parent: Option<NodeId>, depth: u32) -> Self {
        Self::with_kind(NodeKind::Element, name_id, parent, depth)
    }

    /// Create a character-data node (text, CDATA, comment) holding `content_id`
    pub fn character_data(kind: NodeKind, content_id: u32, parent: Option<NodeId>, depth: u32) -> Self {
        Self::with_kind(kind, content_id, parent, depth)
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, parent: Option<NodeId>, depth: u32) -> Self {
        Self::with_kind(NodeKind::ProcessingInstruction, target_id, parent, depth)
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy)]
pub struct XmlAttribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Index into string pool for attribute value
    pub value_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let doc = XmlNode::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
        assert_eq!(doc.depth, 0);
    }

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1, Some(0), 1);
        assert!(elem.is_element());
        assert_eq!(elem.parent, Some(0));
        assert_eq!(elem.line, None);
        assert!(!elem.has_children());
    }

    #[test]
    fn test_character_data_is_not_element() {
        let text = XmlNode::character_data(NodeKind::Comment, 3, Some(1), 2);
        assert!(!text.is_element());
        assert_eq!(text.name_id, 3);
    }
}
