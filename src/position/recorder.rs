//! Position Recorder
//!
//! Filter that sits between a streaming parser and another `ScanHandler`.
//! Every event is forwarded unchanged; element-open events additionally
//! push the oracle's current line onto a `PositionQueue`.
//!
//! ```text
//! UnifiedScanner ---> PositionRecorder ---> inner handler (e.g. TreeBuilder)
//!                          |
//!                          v
//!                    PositionQueue (handed off by finish())
//! ```

use super::locator::{Locator, PositionOracle};
use super::queue::PositionQueue;
use crate::core::{ScanHandler, Span};
use crate::error::PositionError;

/// Records one line per element-open event while forwarding all events.
///
/// `ScanHandler` callbacks cannot fail, so the first usage error is latched
/// and returned by `finish()`.
pub struct PositionRecorder<H, O = Locator> {
    inner: H,
    oracle: Option<O>,
    /// `None` until the document starts
    queue: Option<PositionQueue>,
    error: Option<PositionError>,
}

impl<H, O: PositionOracle> PositionRecorder<H, O> {
    /// Wrap `inner`, which keeps receiving every event
    pub fn new(inner: H) -> Self {
        PositionRecorder {
            inner,
            oracle: None,
            queue: None,
            error: None,
        }
    }

    /// Begin a document with an empty queue.
    ///
    /// A recorder serves one document; a second start is rejected.
    pub fn on_document_start(&mut self) -> Result<(), PositionError> {
        if self.queue.is_some() {
            return Err(PositionError::InvalidReentry {
                operation: "document started twice on one recorder",
            });
        }
        self.queue = Some(PositionQueue::new());
        Ok(())
    }

    /// Keep the parser's oracle for later element-open events
    pub fn on_oracle_attached(&mut self, oracle: O) {
        self.oracle = Some(oracle);
    }

    /// Record the oracle's current line for an element that just opened
    pub fn on_element_open(&mut self) -> Result<(), PositionError> {
        let queue = self.queue.as_mut().ok_or(PositionError::InvalidReentry {
            operation: "element opened before document start",
        })?;
        let oracle = self
            .oracle
            .as_ref()
            .ok_or(PositionError::MissingPositionOracle)?;
        queue.push(oracle.current_line());
        Ok(())
    }

    /// The attached oracle, if any
    pub fn oracle(&self) -> Option<&O> {
        self.oracle.as_ref()
    }

    /// Number of lines recorded so far
    pub fn recorded(&self) -> usize {
        self.queue.as_ref().map_or(0, PositionQueue::len)
    }

    /// First latched error, if any
    pub fn error(&self) -> Option<&PositionError> {
        self.error.as_ref()
    }

    /// The wrapped handler
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Hand off the completed queue together with the inner handler
    pub fn finish(self) -> Result<(PositionQueue, H), PositionError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let queue = self.queue.ok_or(PositionError::InvalidReentry {
            operation: "recorder finished before document start",
        })?;
        tracing::trace!(recorded = queue.len(), "position queue handed off");
        Ok((queue, self.inner))
    }

    /// Keep the first error; later ones are consequences of it
    fn latch(&mut self, result: Result<(), PositionError>) {
        if let Err(err) = result {
            if self.error.is_none() {
                tracing::debug!(error = %err, "position recorder failed");
                self.error = Some(err);
            }
        }
    }
}

impl<H: ScanHandler> ScanHandler for PositionRecorder<H, Locator> {
    fn set_document_locator(&mut self, locator: Locator) {
        self.on_oracle_attached(locator.clone());
        self.inner.set_document_locator(locator);
    }

    fn start_document(&mut self) {
        let result = self.on_document_start();
        self.latch(result);
        self.inner.start_document();
    }

    fn start_element(&mut self, name: Span, attrs: &[(Span, Span)], is_empty: bool) {
        self.inner.start_element(name, attrs, is_empty);
        if self.error.is_none() {
            let result = self.on_element_open();
            self.latch(result);
        }
    }

    fn end_element(&mut self, name: Span) {
        self.inner.end_element(name);
    }

    fn text(&mut self, span: Span, needs_entity_decode: bool) {
        self.inner.text(span, needs_entity_decode);
    }

    fn cdata(&mut self, span: Span) {
        self.inner.cdata(span);
    }

    fn comment(&mut self, span: Span) {
        self.inner.comment(span);
    }

    fn processing_instruction(&mut self, target: Span, data: Option<Span>) {
        self.inner.processing_instruction(target, data);
    }

    fn xml_declaration(&mut self, content: Option<Span>) {
        self.inner.xml_declaration(content);
    }

    fn doctype(&mut self, content: Span) {
        self.inner.doctype(content);
    }

    fn end_document(&mut self) {
        self.inner.end_document();
    }
}
