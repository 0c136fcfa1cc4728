//! Parsing Strategy Module
//!
//! - annotated: single document, scanner + recorder + tree builder + annotator
//! - parallel: independent documents annotated concurrently with rayon

pub mod annotated;
pub mod parallel;

pub use annotated::{element_lines, parse_with_lines, ParseOptions};
pub use parallel::element_lines_parallel;
