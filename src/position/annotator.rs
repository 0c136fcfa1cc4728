//! Tree Annotator
//!
//! Walks a finished tree in element-only pre-order and attaches one queued
//! line per element. Pre-order over elements is exactly the order in which
//! their start tags fired, so the queue needs no keys: the n-th element
//! visited takes the n-th recorded line.
//!
//! The walk uses an explicit ancestor stack, so deeply nested documents
//! cannot exhaust the call stack.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::queue::PositionQueue;
use crate::error::{Mismatch, PositionError};

/// Tree navigation plus line storage, as seen by the annotator.
///
/// Non-element nodes (text, comments, ...) must be reachable as siblings so
/// the walk can skip them; they never receive a line.
pub trait ElementTree {
    type Node: Copy + Eq + Hash + Debug;

    fn is_element(&self, node: Self::Node) -> bool;

    /// First child of any kind
    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Store `line` on an element. Returns false if it already carries one.
    fn attach_line(&mut self, node: Self::Node, line: u32) -> bool;
}

/// First element among `start` and its following siblings
fn element_from<T: ElementTree + ?Sized>(tree: &T, mut start: Option<T::Node>) -> Option<T::Node> {
    while let Some(node) = start {
        if tree.is_element(node) {
            return Some(node);
        }
        start = tree.next_sibling(node);
    }
    None
}

#[inline]
fn first_element_child<T: ElementTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    element_from(tree, tree.first_child(node))
}

#[inline]
fn next_element_sibling<T: ElementTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    element_from(tree, tree.next_sibling(node))
}

fn prev_element_sibling<T: ElementTree + ?Sized>(tree: &T, node: T::Node) -> Option<T::Node> {
    let mut current = tree.prev_sibling(node);
    while let Some(n) = current {
        if tree.is_element(n) {
            return Some(n);
        }
        current = tree.prev_sibling(n);
    }
    None
}

/// Walk progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    NotStarted,
    /// Moving down or across to the next unvisited element
    Descending,
    /// Popping ancestors in search of a next sibling
    Ascending,
    Done,
}

/// Single-use walker that drains a queue onto a tree
pub struct TreeAnnotator<'t, T: ElementTree> {
    tree: &'t mut T,
    queue: PositionQueue,
    stack: Vec<T::Node>,
    state: WalkState,
    annotated: usize,
}

impl<'t, T: ElementTree> TreeAnnotator<'t, T> {
    pub fn new(tree: &'t mut T, queue: PositionQueue) -> Self {
        TreeAnnotator {
            tree,
            queue,
            stack: Vec::with_capacity(32),
            state: WalkState::NotStarted,
            annotated: 0,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Elements annotated so far
    pub fn annotated(&self) -> usize {
        self.annotated
    }

    /// Annotate the subtree of `root`, returning the number of elements
    /// that received a line.
    ///
    /// `root` must be the document element of the parse that produced the
    /// queue; that pairing cannot be verified here. On error the tree is left
    /// partially annotated.
    pub fn run(&mut self, root: T::Node) -> Result<usize, PositionError> {
        if self.state != WalkState::NotStarted {
            return Err(PositionError::InvalidReentry {
                operation: "annotator run twice",
            });
        }
        self.state = WalkState::Descending;
        let result = self.walk(root);
        if result.is_err() {
            tracing::debug!(annotated = self.annotated, "annotation aborted");
        }
        result
    }

    fn walk(&mut self, root: T::Node) -> Result<usize, PositionError> {
        let tree = &*self.tree;
        if !tree.is_element(root) {
            return Err(PositionError::mismatch(Mismatch::NotAnElement));
        }
        if prev_element_sibling(tree, root).is_some() || next_element_sibling(tree, root).is_some() {
            return Err(PositionError::mismatch(Mismatch::MultipleRootElements));
        }

        let mut cursor = root;
        'walk: loop {
            if let Some(child) = first_element_child(&*self.tree, cursor) {
                // Internal node: annotate, remember, go down
                self.stack.push(cursor);
                self.apply(cursor)?;
                cursor = child;
                continue;
            }

            // Leaf
            self.apply(cursor)?;
            if let Some(sibling) = next_element_sibling(&*self.tree, cursor) {
                cursor = sibling;
                continue;
            }

            self.state = WalkState::Ascending;
            loop {
                let Some(ancestor) = self.stack.pop() else {
                    self.state = WalkState::Done;
                    break 'walk;
                };
                if let Some(sibling) = next_element_sibling(&*self.tree, ancestor) {
                    cursor = sibling;
                    self.state = WalkState::Descending;
                    break;
                }
            }
        }

        if !self.queue.is_empty() {
            return Err(PositionError::mismatch(Mismatch::QueueNotDrained {
                remaining: self.queue.len(),
            }));
        }

        tracing::debug!(elements = self.annotated, "element lines attached");
        Ok(self.annotated)
    }

    /// Dequeue one line onto `node`
    fn apply(&mut self, node: T::Node) -> Result<(), PositionError> {
        let line = self.queue.pop().ok_or(PositionError::mismatch(Mismatch::QueueExhausted {
            annotated: self.annotated,
        }))?;
        if !self.tree.attach_line(node, line) {
            return Err(PositionError::InvalidReentry {
                operation: "element already carries a line",
            });
        }
        self.annotated += 1;
        Ok(())
    }
}

/// Attach every queued line to the elements under `root`, in pre-order.
///
/// Fails with `QueueTreeMismatch` unless the queue holds exactly one line
/// per element.
pub fn annotate<T: ElementTree>(
    tree: &mut T,
    root: T::Node,
    queue: PositionQueue,
) -> Result<(), PositionError> {
    TreeAnnotator::new(tree, queue).run(root).map(|_| ())
}

/// Side table of element lines for trees that are not mutated
#[derive(Debug, Clone)]
pub struct LineTable<N> {
    lines: HashMap<N, u32>,
}

impl<N: Copy + Eq + Hash> LineTable<N> {
    pub fn new() -> Self {
        LineTable {
            lines: HashMap::new(),
        }
    }

    /// Line attached to `node`
    pub fn get(&self, node: N) -> Option<u32> {
        self.lines.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Insert unless present; returns whether the line was stored
    fn insert_once(&mut self, node: N, line: u32) -> bool {
        match self.lines.entry(node) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(line);
                true
            }
        }
    }
}

impl<N: Copy + Eq + Hash> Default for LineTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a tree that collects lines into a `LineTable`
pub struct Detached<'t, T: ElementTree> {
    tree: &'t T,
    table: LineTable<T::Node>,
}

impl<'t, T: ElementTree> Detached<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        Detached {
            tree,
            table: LineTable::new(),
        }
    }

    pub fn into_table(self) -> LineTable<T::Node> {
        self.table
    }
}

impl<T: ElementTree> ElementTree for Detached<'_, T> {
    type Node = T::Node;

    fn is_element(&self, node: Self::Node) -> bool {
        self.tree.is_element(node)
    }

    fn first_child(&self, node: Self::Node) -> Option<Self::Node> {
        self.tree.first_child(node)
    }

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        self.tree.next_sibling(node)
    }

    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node> {
        self.tree.prev_sibling(node)
    }

    fn attach_line(&mut self, node: Self::Node, line: u32) -> bool {
        self.table.insert_once(node, line)
    }
}

/// Annotate without touching the tree, returning the lines as a table
pub fn annotate_detached<T: ElementTree>(
    tree: &T,
    root: T::Node,
    queue: PositionQueue,
) -> Result<LineTable<T::Node>, PositionError> {
    let mut detached = Detached::new(tree);
    annotate(&mut detached, root, queue)?;
    Ok(detached.into_table())
}
