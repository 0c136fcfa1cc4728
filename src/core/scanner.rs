//! SIMD-accelerated XML scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)
//!
//! Newline counting for line tracking goes through the same path.

use memchr::{memchr, memchr_iter};

/// Scanner for XML delimiter detection
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Length of the whole input
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes, clamped to input length
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.input.len());
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() {
            match self.input[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        let mut in_single_quote = false;
        let mut in_double_quote = false;

        while pos < self.input.len() {
            match self.input[pos] {
                b'"' if !in_single_quote => in_double_quote = !in_double_quote,
                b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
                b'>' if !in_single_quote && !in_double_quote => return Some(pos),
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Count '\n' bytes in `start..end`
    ///
    /// A lone '\r' is not a line break here; CRLF counts once via its '\n'.
    #[inline]
    pub fn count_newlines(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.input.len());
        if start >= end {
            return 0;
        }
        memchr_iter(b'\n', &self.input[start..end]).count()
    }

    /// Read an XML name (starts with letter/underscore, continues with letters/digits/hyphens/underscores/periods)
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;

        let first = *self.input.get(start)?;
        if !is_name_start_char(first) {
            return None;
        }

        self.pos += 1;

        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
