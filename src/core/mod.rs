//! Core XML scanning primitives
//!
//! - Scanner: SIMD-accelerated delimiter and newline search using memchr
//! - Span: offset + length references into the input
//! - UnifiedScanner: drives a ScanHandler with structural events and a
//!   live line locator

pub mod scanner;
pub mod span;
pub mod unified_scanner;

pub use span::{Span, MAX_INPUT_LEN};
pub use unified_scanner::{ScanHandler, UnifiedScanner};
