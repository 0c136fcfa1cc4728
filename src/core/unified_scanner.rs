//! Unified Scanner with ScanHandler Trait
//!
//! Streams XML structural events to a `ScanHandler` in document order.
//! Handlers receive spans (byte offsets) instead of string copies, plus a
//! `Locator` that reports the current source line while the scan runs.
//!
//! The scanner is lenient: malformed markup degrades to text and never
//! aborts the scan. Well-formedness checks belong to handlers.

use super::scanner::{is_name_start_char, Scanner};
use super::span::Span;
use crate::position::Locator;

/// Trait for handling scan events
///
/// Call order for one document:
/// `set_document_locator`, `start_document`, content events, `end_document`.
pub trait ScanHandler {
    /// Called once, before `start_document`, with the parse's locator
    fn set_document_locator(&mut self, _locator: Locator) {}

    /// Called once before any content event
    fn start_document(&mut self) {}

    /// Called when an element starts
    ///
    /// # Arguments
    /// * `name` - Span of the element name in the input
    /// * `attrs` - Slice of (name_span, value_span) pairs
    /// * `is_empty` - True if this is a self-closing element (e.g., `<br/>`)
    fn start_element(&mut self, name: Span, attrs: &[(Span, Span)], is_empty: bool);

    /// Called when an element ends (not called for self-closing elements)
    fn end_element(&mut self, name: Span);

    /// Called for text content
    ///
    /// `needs_entity_decode` is true if the text contains entity references.
    fn text(&mut self, span: Span, needs_entity_decode: bool);

    /// Called for CDATA sections (span excludes `<![CDATA[` and `]]>`)
    fn cdata(&mut self, span: Span);

    /// Called for comments (span excludes `<!--` and `-->`)
    fn comment(&mut self, span: Span);

    /// Called for processing instructions other than the XML declaration
    fn processing_instruction(&mut self, target: Span, data: Option<Span>);

    /// Called for `<?xml ...?>` with the span of its pseudo-attributes
    fn xml_declaration(&mut self, _content: Option<Span>) {}

    /// Called for DOCTYPE
    fn doctype(&mut self, _content: Span) {}

    /// Called once after the last content event
    fn end_document(&mut self) {}
}

/// Unified scanner that uses ScanHandler for event dispatch
pub struct UnifiedScanner<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    /// Reusable attribute buffer to avoid per-element allocations
    attrs_buf: Vec<(Span, Span)>,
    locator: Locator,
    /// Offset up to which newlines have been folded into `locator`
    line_synced: usize,
}

impl<'a> UnifiedScanner<'a> {
    /// Create a new unified scanner for the input
    ///
    /// Spans are `u32`; inputs longer than `MAX_INPUT_LEN` must be rejected
    /// by the caller, since offsets past it saturate.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            scanner: Scanner::new(input),
            attrs_buf: Vec::with_capacity(8), // Most elements have < 8 attrs
            locator: Locator::new(),
            line_synced: 0,
        }
    }

    /// Locator for this scan
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Scan the entire document, calling handler methods for each token
    pub fn scan<H: ScanHandler>(&mut self, handler: &mut H) {
        handler.set_document_locator(self.locator.clone());
        handler.start_document();

        while !self.scanner.is_eof() {
            match self.scanner.peek() {
                Some(b'<') => self.scan_markup(handler),
                Some(_) => self.scan_text(handler),
                None => break,
            }
        }

        self.sync_locator();
        handler.end_document();
    }

    /// Fold newlines consumed since the last sync into the locator
    #[inline]
    fn sync_locator(&mut self) {
        let pos = self.scanner.position();
        if pos > self.line_synced {
            let newlines = self.scanner.count_newlines(self.line_synced, pos);
            if newlines > 0 {
                let line = self.locator.line().saturating_add(newlines as u32);
                self.locator.set_line(line);
            }
            self.line_synced = pos;
        }
    }

    /// Scan markup starting with '<'
    fn scan_markup<H: ScanHandler>(&mut self, handler: &mut H) {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'

        match self.scanner.peek() {
            Some(b'/') => {
                self.scanner.advance(1);
                self.scan_end_tag(handler);
            }
            Some(b'!') => {
                self.scanner.advance(1);
                match (self.scanner.peek(), self.scanner.peek_at(1)) {
                    (Some(b'-'), Some(b'-')) => {
                        self.scanner.advance(2);
                        self.scan_comment(handler);
                    }
                    (Some(b'['), _) => {
                        if self.scanner.starts_with(b"[CDATA[") {
                            self.scanner.advance(7);
                            self.scan_cdata(handler);
                        } else {
                            self.skip_to_tag_end();
                        }
                    }
                    (Some(b'D'), _) | (Some(b'd'), _) => {
                        self.scan_doctype(handler);
                    }
                    _ => {
                        self.skip_to_tag_end();
                    }
                }
            }
            Some(b'?') => {
                self.scanner.advance(1);
                self.scan_pi(handler);
            }
            Some(c) if is_name_start_char(c) => {
                self.scan_start_tag(handler);
            }
            _ => {
                // Invalid markup (e.g., "<1invalid/>"): emit '<' as literal text
                // and continue from the byte after it
                self.sync_locator();
                handler.text(Span::between(start, start + 1), false);
            }
        }
    }

    /// Scan a start tag; the scanner sits just past '<'
    fn scan_start_tag<H: ScanHandler>(&mut self, handler: &mut H) {
        let name_start = self.scanner.position();
        if self.scanner.read_name().is_none() {
            return;
        }
        let name_span = Span::between(name_start, self.scanner.position());

        self.attrs_buf.clear();
        self.scanner.skip_whitespace();

        while !self.scanner.is_eof() {
            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    self.sync_locator();
                    handler.start_element(name_span, &self.attrs_buf, false);
                    return;
                }
                Some(b'/') if self.scanner.peek_at(1) == Some(b'>') => {
                    self.scanner.advance(2);
                    self.sync_locator();
                    handler.start_element(name_span, &self.attrs_buf, true);
                    return;
                }
                Some(c) if is_name_start_char(c) => {
                    if let Some(attr) = self.scan_attribute() {
                        self.attrs_buf.push(attr);
                    }
                    // A malformed attribute always consumes at least its name
                }
                _ => {
                    self.scanner.advance(1);
                }
            }
            self.scanner.skip_whitespace();
        }
        // Unterminated start tag at EOF: no event
    }

    /// Scan an attribute, returning (name_span, value_span)
    fn scan_attribute(&mut self) -> Option<(Span, Span)> {
        let name_start = self.scanner.position();
        self.scanner.read_name()?;
        let name_end = self.scanner.position();

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return None;
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let quote = self.scanner.peek()?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        self.scanner.advance(1);

        let value_start = self.scanner.position();
        let value_end = match self.scanner.find_byte(quote) {
            Some(pos) => pos,
            None => self.scanner.len(),
        };
        self.scanner.set_position(value_end);
        self.scanner.advance(1); // closing quote

        Some((
            Span::between(name_start, name_end),
            Span::between(value_start, value_end),
        ))
    }

    /// Scan an end tag; the scanner sits just past '</'
    fn scan_end_tag<H: ScanHandler>(&mut self, handler: &mut H) {
        self.scanner.skip_whitespace();

        let name_start = self.scanner.position();
        if self.scanner.read_name().is_none() {
            self.skip_to_tag_end();
            return;
        }
        let name_span = Span::between(name_start, self.scanner.position());

        self.scanner.skip_whitespace();
        if self.scanner.peek() == Some(b'>') {
            self.scanner.advance(1);
        }

        self.sync_locator();
        handler.end_element(name_span);
    }

    /// Scan text content up to the next '<'
    fn scan_text<H: ScanHandler>(&mut self, handler: &mut H) {
        let start = self.scanner.position();
        let end = self.scanner.find_byte(b'<').unwrap_or(self.scanner.len());
        let needs_decode = memchr::memchr(b'&', &self.input[start..end]).is_some();
        self.scanner.set_position(end);

        if end > start {
            self.sync_locator();
            handler.text(Span::between(start, end), needs_decode);
        }
    }

    /// Scan a comment; the scanner sits just past '<!--'
    fn scan_comment<H: ScanHandler>(&mut self, handler: &mut H) {
        let content_start = self.scanner.position();
        let content_end = self.find_terminator(b'-', b"-->");
        self.sync_locator();
        handler.comment(Span::between(content_start, content_end));
    }

    /// Scan a CDATA section; the scanner sits just past '<![CDATA['
    fn scan_cdata<H: ScanHandler>(&mut self, handler: &mut H) {
        let content_start = self.scanner.position();
        let content_end = self.find_terminator(b']', b"]]>");
        self.sync_locator();
        handler.cdata(Span::between(content_start, content_end));
    }

    /// Advance past `terminator`, returning where the content before it ends.
    /// Unterminated constructs run to end of input.
    fn find_terminator(&mut self, first: u8, terminator: &[u8]) -> usize {
        loop {
            match self.scanner.find_byte(first) {
                Some(pos) => {
                    self.scanner.set_position(pos);
                    if self.scanner.starts_with(terminator) {
                        self.scanner.advance(terminator.len());
                        return pos;
                    }
                    self.scanner.advance(1);
                }
                None => {
                    let end = self.input.len();
                    self.scanner.set_position(end);
                    return end;
                }
            }
        }
    }

    /// Scan a processing instruction; the scanner sits just past '<?'
    fn scan_pi<H: ScanHandler>(&mut self, handler: &mut H) {
        let target_start = self.scanner.position();
        let is_decl = match self.scanner.read_name() {
            Some(target) => target == b"xml",
            None => {
                self.find_terminator(b'?', b"?>");
                return;
            }
        };
        let target_span = Span::between(target_start, self.scanner.position());

        self.scanner.skip_whitespace();
        let data_start = self.scanner.position();
        let data_end = self.find_terminator(b'?', b"?>");
        let data_span = (data_end > data_start).then(|| Span::between(data_start, data_end));

        self.sync_locator();
        if is_decl {
            handler.xml_declaration(data_span);
        } else {
            handler.processing_instruction(target_span, data_span);
        }
    }

    /// Scan DOCTYPE; the scanner sits just past '<!'
    fn scan_doctype<H: ScanHandler>(&mut self, handler: &mut H) {
        let start = self.scanner.position();

        if self.scanner.starts_with(b"DOCTYPE") || self.scanner.starts_with(b"doctype") {
            self.scanner.advance(7);
        }

        // Internal subset may contain '>' inside brackets
        let mut depth = 0usize;

        while let Some(c) = self.scanner.peek() {
            match c {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    let span = Span::between(start, self.scanner.position());
                    self.scanner.advance(1);
                    self.sync_locator();
                    handler.doctype(span);
                    return;
                }
                _ => {}
            }
            self.scanner.advance(1);
        }
    }

    /// Skip to the end of a tag (find '>')
    fn skip_to_tag_end(&mut self) {
        match self.scanner.find_tag_end_quoted() {
            Some(pos) => self.scanner.set_position(pos + 1),
            None => self.scanner.set_position(self.input.len()),
        }
    }
}
