//! Indexed binary min-heap with arbitrary removal
//!
//! Every heap of the matching engine stores plain `usize` handles (edge or
//! node indices of the solver arenas) keyed by an `f64`. A reverse index maps
//! each handle to its slot in the heap array, so removing an element from the
//! middle of the heap costs O(log n) instead of a linear scan.
//!
//! # Ordering
//! Keys are compared with [`f64::total_cmp`]; equal keys fall back to the
//! handle value so that extraction order is fully deterministic.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::cmp::Ordering;
use std::collections::HashMap;

/// Heap slot: handle plus its priority
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    id: usize,
    key: f64,
}

impl HeapEntry {
    #[inline]
    fn precedes(&self, other: &HeapEntry) -> bool {
        match self.key.total_cmp(&other.key) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => self.id < other.id,
        }
    }
}

/// Indexed min-heap over `usize` handles
#[derive(Debug, Clone, Default)]
pub struct IndexedPriorityQueue {
    /// Complete binary tree in array layout
    heap: Vec<HeapEntry>,

    /// Reverse lookup: handle -> slot in `heap`
    positions: HashMap<usize, usize>,
}

impl IndexedPriorityQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Inserts `id` with priority `key`. Returns `false` when the handle is
    /// already present, in which case the queue is left untouched.
    pub fn insert(&mut self, id: usize, key: f64) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        let pos = self.heap.len();
        self.heap.push(HeapEntry { id, key });
        self.positions.insert(id, pos);
        self.sift_up(pos);
        true
    }

    /// Minimum element without removing it
    pub fn peek(&self) -> Option<(usize, f64)> {
        self.heap.first().map(|entry| (entry.id, entry.key))
    }

    /// Removes `id` from any position, returning its key
    pub fn remove(&mut self, id: usize) -> Option<f64> {
        let pos = self.positions.remove(&id)?;
        let removed = self.heap.swap_remove(pos);

        if pos < self.heap.len() {
            let moved = self.heap[pos].id;
            self.positions.insert(moved, pos);
            if pos > 0 && self.heap[pos].precedes(&self.heap[(pos - 1) / 2]) {
                self.sift_up(pos);
            } else {
                self.sift_down(pos);
            }
        }

        Some(removed.key)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.heap[pos].precedes(&self.heap[parent]) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < len && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].id, a);
        self.positions.insert(self.heap[b].id, b);
    }
}
