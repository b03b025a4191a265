//! Path requests and the queue they wait in.
//!
//! Requests are stored in a min-heap keyed by `(rank, insertion_order)`.
//! Lower ranks are served first; ties are broken by insertion order
//! (FIFO).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use waygrid_core::Vec2;

/// Identifies one path request from submission to delivery.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    /// The raw id, increasing with submission order.
    #[inline]
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request for a route between two world positions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathRequest {
    pub ticket: Ticket,
    pub start: Vec2,
    pub end: Vec2,
}

/// An entry in the request queue.
#[derive(Debug)]
struct Entry {
    request: PathRequest,
    rank: i32,
    /// Monotonically increasing counter used to break ties.
    seq: u64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Wrapped in Reverse for the BinaryHeap: smaller rank first, then
        // smaller seq.
        self.rank.cmp(&other.rank).then(self.seq.cmp(&other.seq))
    }
}

/// Pending path requests, served lowest rank first and FIFO within a rank.
#[derive(Debug, Default)]
pub struct RequestQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl RequestQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request at the given rank.
    pub fn push(&mut self, request: PathRequest, rank: i32) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(Entry { request, rank, seq }));
    }

    /// Take the next request to serve.
    pub fn pop(&mut self) -> Option<PathRequest> {
        self.heap.pop().map(|Reverse(entry)| entry.request)
    }

    /// The next request to serve, without removing it.
    pub fn peek(&self) -> Option<&PathRequest> {
        self.heap.peek().map(|Reverse(entry)| &entry.request)
    }

    /// Remove the request with `ticket`, if queued.
    pub fn remove(&mut self, ticket: Ticket) -> Option<PathRequest> {
        if !self.heap.iter().any(|Reverse(e)| e.request.ticket == ticket) {
            return None;
        }
        let old_heap = std::mem::take(&mut self.heap);
        let mut removed = None;
        self.heap = old_heap
            .into_iter()
            .filter_map(|Reverse(entry)| {
                if entry.request.ticket == ticket {
                    removed = Some(entry.request);
                    None
                } else {
                    Some(Reverse(entry))
                }
            })
            .collect();
        removed
    }

    /// Whether a request with `ticket` is queued.
    pub fn contains(&self, ticket: Ticket) -> bool {
        self.heap.iter().any(|Reverse(e)| e.request.ticket == ticket)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(id: u64) -> PathRequest {
        PathRequest {
            ticket: Ticket(id),
            start: Vec2::ZERO,
            end: Vec2::ONE,
        }
    }

    fn drain(q: &mut RequestQueue) -> Vec<u64> {
        std::iter::from_fn(|| q.pop().map(|r| r.ticket.id())).collect()
    }

    #[test]
    fn lower_rank_first() {
        let mut q = RequestQueue::new();
        q.push(req(1), 3);
        q.push(req(2), 1);
        q.push(req(3), 2);
        assert_eq!(q.peek().map(|r| r.ticket), Some(Ticket(2)));
        assert_eq!(drain(&mut q), vec![2, 3, 1]);
        assert!(q.pop().is_none());
    }

    #[test]
    fn fifo_within_rank() {
        let mut q = RequestQueue::new();
        for id in 0..5 {
            q.push(req(id), 0);
        }
        assert_eq!(drain(&mut q), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn remove_by_ticket() {
        let mut q = RequestQueue::new();
        q.push(req(1), 0);
        q.push(req(2), 0);
        q.push(req(3), 0);
        assert!(q.contains(Ticket(2)));
        assert_eq!(q.remove(Ticket(2)).map(|r| r.ticket), Some(Ticket(2)));
        assert!(!q.contains(Ticket(2)));
        assert!(q.remove(Ticket(2)).is_none());
        assert_eq!(q.len(), 2);
        assert_eq!(drain(&mut q), vec![1, 3]);
    }

    #[test]
    fn ticket_display() {
        assert_eq!(Ticket(12).to_string(), "#12");
    }
}
