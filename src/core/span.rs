//! Span - offset and length into original input
//!
//! Zero-copy reference to a portion of the input document.
//! Element names, attribute names/values and character data are all
//! passed to handlers as spans.
//!
//! Offsets are `u32`, so inputs are limited to `MAX_INPUT_LEN` bytes.

/// Largest input whose offsets fit in a span
pub const MAX_INPUT_LEN: usize = u32::MAX as usize;

/// A span referencing a portion of the input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the original input
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Span covering `start..end` of the input
    ///
    /// Offsets past `MAX_INPUT_LEN` saturate instead of wrapping.
    #[inline]
    pub fn between(start: usize, end: usize) -> Self {
        let offset = u32::try_from(start).unwrap_or(u32::MAX);
        let len = u32::try_from(end.saturating_sub(start)).unwrap_or(u32::MAX);
        Self::new(offset, len)
    }

    /// Create an empty span (used for "no value")
    #[inline]
    pub const fn empty() -> Self {
        Self { offset: 0, len: 0 }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// Extract the byte slice from input
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.offset as usize;
        let end = start.saturating_add(self.len as usize);
        if end <= input.len() {
            &input[start..end]
        } else {
            &[]
        }
    }

    /// Extract as UTF-8 string from input
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(5, 10);
        assert_eq!(span.end(), 15);
        assert!(!span.is_empty());
        assert!(Span::empty().is_empty());
    }

    #[test]
    fn test_span_between() {
        let input = b"hello world";
        let span = Span::between(6, 11);
        assert_eq!(span.slice(input), b"world");
        assert_eq!(span.as_str(input), Some("world"));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_span_between_saturates() {
        let far = MAX_INPUT_LEN + 10;
        let span = Span::between(far, far + 4);
        assert_eq!(span.offset, u32::MAX);
        assert_eq!(span.len, 4);
        assert_eq!(span.slice(b"short"), b"");
    }

    #[test]
    fn test_span_out_of_range() {
        let span = Span::new(8, 10);
        assert_eq!(span.slice(b"short"), b"");
    }
}
