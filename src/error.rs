//! Error types
//!
//! Every error here is a precondition violation, not a transient fault:
//! callers abort and propagate, nothing is retried or padded.

use std::fmt;

/// Why a position queue and a tree failed to line up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The queue ran dry after `annotated` elements received a line
    QueueExhausted { annotated: usize },
    /// Traversal finished with `remaining` lines still queued
    QueueNotDrained { remaining: usize },
    /// The document has no root element to start from
    NoRootElement,
    /// The start node is not an element
    NotAnElement,
    /// The root element has element siblings
    MultipleRootElements,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::QueueExhausted { annotated } => {
                write!(f, "position queue exhausted after {} elements", annotated)
            }
            Mismatch::QueueNotDrained { remaining } => {
                write!(f, "{} recorded positions left after traversal", remaining)
            }
            Mismatch::NoRootElement => write!(f, "document has no root element"),
            Mismatch::NotAnElement => write!(f, "annotation root is not an element"),
            Mismatch::MultipleRootElements => write!(f, "document has multiple root elements"),
        }
    }
}

/// Errors raised while recording or attaching element positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// An element opened before the parser supplied a position oracle
    MissingPositionOracle,
    /// Recorded positions and tree elements disagree
    QueueTreeMismatch { reason: Mismatch },
    /// An operation was invoked out of order
    InvalidReentry { operation: &'static str },
}

impl PositionError {
    pub(crate) fn mismatch(reason: Mismatch) -> Self {
        PositionError::QueueTreeMismatch { reason }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::MissingPositionOracle => {
                write!(f, "element opened before a position oracle was attached")
            }
            PositionError::QueueTreeMismatch { reason } => {
                write!(f, "queue/tree mismatch: {}", reason)
            }
            PositionError::InvalidReentry { operation } => {
                write!(f, "invalid reentry: {}", operation)
            }
        }
    }
}

impl std::error::Error for PositionError {}

/// Structural error found by the strict tree builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the offending construct
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// Any failure of the parse-and-annotate pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(ParseError),
    Position(PositionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "parse error: {}", e),
            Error::Position(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Position(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<PositionError> for Error {
    fn from(e: PositionError) -> Self {
        Error::Position(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = PositionError::mismatch(Mismatch::QueueExhausted { annotated: 3 });
        assert_eq!(
            err.to_string(),
            "queue/tree mismatch: position queue exhausted after 3 elements"
        );

        let err = Error::from(ParseError::new("Unclosed tag: <a>", 7));
        assert_eq!(err.to_string(), "parse error: Unclosed tag: <a> at byte 7");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let err = Error::from(PositionError::MissingPositionOracle);
        assert!(err.source().is_some());
    }
}
