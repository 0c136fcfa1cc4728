//! Element line correlation
//!
//! Two phases joined by an owned queue:
//! - `PositionRecorder` wraps a streaming handler and records the parser's
//!   current line at every element-open event
//! - `TreeAnnotator` walks the finished tree in element pre-order and
//!   attaches those lines, one per element
//!
//! The phases share nothing but the `PositionQueue` moved from one to the
//! other.

pub mod annotator;
pub mod locator;
pub mod queue;
pub mod recorder;

pub use annotator::{annotate, annotate_detached, Detached, ElementTree, LineTable, TreeAnnotator, WalkState};
pub use locator::{Locator, PositionOracle};
pub use queue::PositionQueue;
pub use recorder::PositionRecorder;
