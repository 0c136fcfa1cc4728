//! Position oracle handed from a streaming parser to its handlers
//!
//! SAX-style parsers expose a live "where am I" handle once per parse and
//! keep it current while they advance. `Locator` is the handle the bundled
//! scanner hands out; anything else that can report a line implements
//! `PositionOracle`.

use std::cell::Cell;
use std::rc::Rc;

/// Reports the line currently being parsed.
///
/// Only meaningful while the parse that produced it is in progress.
pub trait PositionOracle {
    /// 1-based line of the construct the parser just reported
    fn current_line(&self) -> u32;
}

impl<O: PositionOracle + ?Sized> PositionOracle for &O {
    #[inline]
    fn current_line(&self) -> u32 {
        (**self).current_line()
    }
}

/// Shared line cursor written by the scanner, read by handlers.
///
/// Clones observe the same cursor, so a handler that stores a clone at
/// `set_document_locator` time sees every later update.
#[derive(Debug, Clone)]
pub struct Locator {
    line: Rc<Cell<u32>>,
}

impl Locator {
    /// Locator positioned on line 1
    pub fn new() -> Self {
        Locator {
            line: Rc::new(Cell::new(1)),
        }
    }

    /// Current line
    #[inline]
    pub fn line(&self) -> u32 {
        self.line.get()
    }

    #[inline]
    pub(crate) fn set_line(&self, line: u32) {
        self.line.set(line);
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionOracle for Locator {
    #[inline]
    fn current_line(&self) -> u32 {
        self.line()
    }
}
