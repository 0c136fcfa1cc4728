//! Line-Annotated DOM Parse
//!
//! One pass of the scanner feeds a `PositionRecorder` wrapping a
//! `TreeBuilder`; the recorded queue is then drained onto the finished tree.
//!
//! ```text
//! input -> UnifiedScanner -> PositionRecorder -> TreeBuilder -> XmlDocument
//!                                  |                                 ^
//!                                  +---- PositionQueue ---> annotate +
//! ```

use std::borrow::Cow;

use crate::core::{UnifiedScanner, MAX_INPUT_LEN};
use crate::dom::{TreeBuilder, XmlDocument};
use crate::error::{Error, Mismatch, ParseError, PositionError};
use crate::position::{annotate, PositionRecorder};

/// Options for `parse_with_lines`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject malformed structure instead of repairing it
    pub strict: bool,
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions { strict: true }
    }
}

/// Parse `input` into a document whose elements all carry their start-tag line
///
/// Inputs longer than `MAX_INPUT_LEN` are rejected before scanning.
pub fn parse_with_lines(input: &[u8], options: &ParseOptions) -> Result<XmlDocument, Error> {
    check_input_len(input.len())?;

    let builder = if options.strict {
        TreeBuilder::new_strict(input)
    } else {
        TreeBuilder::new(input)
    };

    let mut recorder = PositionRecorder::new(builder);
    UnifiedScanner::new(input).scan(&mut recorder);
    let (queue, builder) = recorder.finish()?;
    let mut doc = builder.finish()?;

    let root = doc
        .root_element_id()
        .ok_or(PositionError::mismatch(Mismatch::NoRootElement))?;
    annotate(&mut doc, root, queue)?;

    tracing::trace!(nodes = doc.node_count(), strict = options.strict, "annotated parse complete");
    Ok(doc)
}

fn check_input_len(len: usize) -> Result<(), ParseError> {
    if len > MAX_INPUT_LEN {
        return Err(ParseError::new(
            format!("Input of {} bytes exceeds the {} byte limit", len, MAX_INPUT_LEN),
            0,
        ));
    }
    Ok(())
}

/// (name, line) for every annotated element, in pre-order
///
/// Names that are not valid UTF-8 are decoded lossily rather than skipped.
pub fn element_lines(doc: &XmlDocument) -> Vec<(Cow<'_, str>, u32)> {
    doc.elements()
        .filter_map(|id| {
            let line = doc.line(id)?;
            Some((doc.name_lossy(id).unwrap_or_default(), line))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(input: &str) -> Vec<(String, u32)> {
        let doc = parse_with_lines(input.as_bytes(), &ParseOptions::default()).unwrap();
        element_lines(&doc)
            .into_iter()
            .map(|(name, line)| (name.into_owned(), line))
            .collect()
    }

    fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
        expected.iter().map(|&(n, l)| (n.to_string(), l)).collect()
    }

    #[test]
    fn test_two_line_document() {
        assert_eq!(
            lines("<a><b/><c>\n<d/></c></a>"),
            pairs(&[("a", 1), ("b", 1), ("c", 1), ("d", 2)])
        );
    }

    #[test]
    fn test_one_element_per_line() {
        assert_eq!(
            lines("<a>\n<b/>\n</a>"),
            pairs(&[("a", 1), ("b", 2)])
        );
    }

    #[test]
    fn test_self_closing_root_after_blank_lines() {
        assert_eq!(lines("\n\n\n\n<root/>"), pairs(&[("root", 5)]));
    }

    #[test]
    fn test_prolog_and_comments_shift_lines() {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE doc>\n<!-- one\ntwo -->\n<doc>\n  <item id=\"1\"/>\n  <![CDATA[\n]]><item id=\"2\"/>\n</doc>\n";
        assert_eq!(
            lines(input),
            pairs(&[("doc", 5), ("item", 6), ("item", 8)])
        );
    }

    #[test]
    fn test_multiline_start_tag_uses_closing_line() {
        assert_eq!(
            lines("<a\n  x=\"1\"\n  y=\"2\">\n<b/></a>"),
            pairs(&[("a", 3), ("b", 4)])
        );
    }

    #[test]
    fn test_only_elements_annotated() {
        let doc = parse_with_lines(b"<a>text<!--c--><?p?></a>", &ParseOptions::default()).unwrap();
        for id in doc.descendants(XmlDocument::DOCUMENT) {
            assert_eq!(doc.line(id).is_some(), doc.is_element(id));
        }
    }

    #[test]
    fn test_empty_document_has_no_root() {
        for input in ["", "   \n", "<!-- nothing -->"] {
            let err = parse_with_lines(input.as_bytes(), &ParseOptions::default()).unwrap_err();
            assert_eq!(
                err,
                Error::Position(PositionError::mismatch(Mismatch::NoRootElement))
            );
        }
    }

    #[test]
    fn test_lenient_multiple_roots_is_mismatch() {
        let err = parse_with_lines(b"<a/>\n<b/>", &ParseOptions::default()).unwrap_err();
        assert_eq!(
            err,
            Error::Position(PositionError::mismatch(Mismatch::MultipleRootElements))
        );
    }

    #[test]
    fn test_strict_reports_parse_error() {
        let err = parse_with_lines(b"<a><b></a>", &ParseOptions::strict()).unwrap_err();
        assert_eq!(
            err,
            Error::Parse(ParseError::new("Tag mismatch: <b> closed with </a>", 8))
        );
        assert_eq!(
            err.to_string(),
            "parse error: Tag mismatch: <b> closed with </a> at byte 8"
        );
    }

    #[test]
    fn test_strict_well_formed() {
        let doc = parse_with_lines(b"<a>\n  <b/>\n</a>\n", &ParseOptions::strict()).unwrap();
        let names: Vec<_> = element_lines(&doc)
            .into_iter()
            .map(|(name, line)| (name.into_owned(), line))
            .collect();
        assert_eq!(names, pairs(&[("a", 1), ("b", 2)]));
    }

    #[test]
    fn test_lenient_repairs_unclosed() {
        assert_eq!(
            lines("<a>\n<b>\n<c/>"),
            pairs(&[("a", 1), ("b", 2), ("c", 3)])
        );
    }

    #[test]
    fn test_non_utf8_names_are_listed() {
        let doc = parse_with_lines(b"<a>\n<\xff/>\n<c/></a>", &ParseOptions::default()).unwrap();
        let listed = element_lines(&doc);
        assert_eq!(listed.len(), doc.elements().count());
        assert_eq!(listed[1], (Cow::Borrowed("\u{fffd}"), 2));
        assert_eq!(listed[2], (Cow::Borrowed("c"), 3));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_input_rejected() {
        assert_eq!(check_input_len(MAX_INPUT_LEN), Ok(()));
        let err = check_input_len(MAX_INPUT_LEN + 1).unwrap_err();
        assert!(err.message.contains("exceeds"));
    }
}
