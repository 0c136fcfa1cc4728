//! String Interning Pool
//!
//! Owned, deduplicated storage for element names, attribute names/values
//! and character data. The document outlives the parse input, so every
//! string is copied once into a single buffer.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// String interning pool
///
/// Memory layout:
/// - `entries`: (offset, len) into `data` for each interned string ID
/// - `data`: concatenated string bytes
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug, Default)]
pub struct StringPool {
    entries: Vec<(u32, u32)>,
    data: Vec<u8>,
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(256),
            data: Vec::with_capacity(4096),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for "no string"
        pool.entries.push((0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &[u8]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its ID. The empty string is always ID 0.
    pub fn intern(&mut self, s: &[u8]) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s);

        let id = self.entries.len() as u32;
        self.entries.push((offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Get a string by ID
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        let &(offset, len) = self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Get a string by ID as UTF-8 str
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.get(id).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Get the number of unique strings stored (including the reserved entry)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1 // Entry 0 is reserved
    }
}
