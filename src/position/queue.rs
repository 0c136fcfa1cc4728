//! FIFO of recorded element lines

use std::collections::VecDeque;

/// Line numbers of element-open events, in firing order.
///
/// Filled by `PositionRecorder`, then moved into the annotator and drained
/// exactly once: one entry per element, front first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionQueue {
    lines: VecDeque<u32>,
}

impl PositionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        PositionQueue {
            lines: VecDeque::with_capacity(64),
        }
    }

    /// Append a line at the tail
    #[inline]
    pub fn push(&mut self, line: u32) {
        self.lines.push_back(line);
    }

    /// Remove the head line
    #[inline]
    pub fn pop(&mut self) -> Option<u32> {
        self.lines.pop_front()
    }

    /// Get number of queued lines
    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Queued lines, head first
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }
}

impl FromIterator<u32> for PositionQueue {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PositionQueue {
            lines: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<u32>> for PositionQueue {
    fn from(lines: Vec<u32>) -> Self {
        PositionQueue {
            lines: lines.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = PositionQueue::new();
        queue.push(3);
        queue.push(1);
        queue.push(2);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_from_vec() {
        let queue = PositionQueue::from(vec![1, 1, 2]);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![1, 1, 2]);
    }
}
