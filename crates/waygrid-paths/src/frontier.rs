//! The open set of an A* search: a binary min-heap over node indices with an
//! index side-table, so membership tests are O(1) and a node whose cost
//! improved can be re-sifted in place.

use std::cmp::Ordering;

/// Slot value for nodes that are not in the heap.
const ABSENT: usize = usize::MAX;

/// A node index together with the costs it is ordered by.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrontierEntry {
    pub idx: usize,
    pub f: i32,
    pub h: i32,
}

impl FrontierEntry {
    /// Ordering key: total cost first, then the heuristic, so that among
    /// equally promising nodes the one nearer the target wins.
    #[inline]
    fn cmp_key(&self, other: &Self) -> Ordering {
        self.f.cmp(&other.f).then(self.h.cmp(&other.h))
    }
}

/// Min-heap of [`FrontierEntry`] ordered by ascending `(f, h)`.
#[derive(Clone, Debug, Default)]
pub struct Frontier {
    heap: Vec<FrontierEntry>,
    /// `slots[idx]` is the heap position of node `idx`, or [`ABSENT`].
    slots: Vec<usize>,
}

impl Frontier {
    /// Create an empty frontier for node indices below `nodes`.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            heap: Vec::new(),
            slots: vec![ABSENT; nodes],
        }
    }

    /// Number of nodes currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove every entry, keeping allocations.
    pub fn clear(&mut self) {
        for e in self.heap.drain(..) {
            self.slots[e.idx] = ABSENT;
        }
    }

    /// Whether node `idx` is in the frontier.
    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        self.slots.get(idx).is_some_and(|&s| s != ABSENT)
    }

    /// The lowest-cost entry, without removing it.
    #[inline]
    pub fn peek_min(&self) -> Option<FrontierEntry> {
        self.heap.first().copied()
    }

    /// Add node `idx` with the given costs.
    ///
    /// A node that is already present is re-prioritised instead, so the
    /// frontier never holds duplicates.
    pub fn insert(&mut self, idx: usize, f: i32, h: i32) {
        if self.contains(idx) {
            self.update_priority(idx, f, h);
            return;
        }
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, ABSENT);
        }
        let pos = self.heap.len();
        self.heap.push(FrontierEntry { idx, f, h });
        self.slots[idx] = pos;
        self.sift_up(pos);
    }

    /// Remove and return the entry with the smallest `(f, h)`.
    pub fn pop_min(&mut self) -> Option<FrontierEntry> {
        let last = self.heap.len().checked_sub(1)?;
        self.swap(0, last);
        let min = self.heap.pop()?;
        self.slots[min.idx] = ABSENT;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(min)
    }

    /// Replace the costs of node `idx` and restore heap order from its
    /// current position. Returns `false` if the node is not present.
    pub fn update_priority(&mut self, idx: usize, f: i32, h: i32) -> bool {
        if !self.contains(idx) {
            return false;
        }
        let pos = self.slots[idx];
        let old = self.heap[pos];
        self.heap[pos].f = f;
        self.heap[pos].h = h;
        match self.heap[pos].cmp_key(&old) {
            Ordering::Less => self.sift_up(pos),
            Ordering::Greater => self.sift_down(pos),
            Ordering::Equal => {}
        }
        true
    }

    // -----------------------------------------------------------------------
    // Heap maintenance
    // -----------------------------------------------------------------------

    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a].idx] = a;
        self.slots[self.heap[b].idx] = b;
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].cmp_key(&self.heap[parent]) != Ordering::Less {
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
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len
                && self.heap[right].cmp_key(&self.heap[left]) == Ordering::Less
            {
                right
            } else {
                left
            };
            if self.heap[child].cmp_key(&self.heap[pos]) != Ordering::Less {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
    }
}
