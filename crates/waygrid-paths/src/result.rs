//! Path results and the sinks they are delivered to.

use waygrid_core::{Point, Vec2};

use crate::error::PathError;
use crate::request::Ticket;

/// Outcome of one completed search.
///
/// A search that finds no route is still a result: `success` is `false` and
/// the waypoint list is empty.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathResult {
    /// Pivot positions from the first step after the start to the target.
    pub waypoints: Vec<Vec2>,
    /// Grid coordinates matching `waypoints`.
    pub cells: Vec<Point>,
    /// Total movement cost of the route; 0 when there is none.
    pub cost: i32,
    pub success: bool,
}

impl PathResult {
    /// A route was found.
    pub fn found(waypoints: Vec<Vec2>, cells: Vec<Point>, cost: i32) -> Self {
        Self {
            waypoints,
            cells,
            cost,
            success: true,
        }
    }

    /// No route exists.
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Number of waypoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Receiver for finished path requests. Each request is delivered exactly
/// once, either with a result or with the error that stopped it.
pub trait ResultSink {
    fn deliver(&mut self, ticket: Ticket, outcome: Result<PathResult, PathError>);
}

impl<F: FnMut(Ticket, Result<PathResult, PathError>)> ResultSink for F {
    fn deliver(&mut self, ticket: Ticket, outcome: Result<PathResult, PathError>) {
        self(ticket, outcome)
    }
}

/// A [`ResultSink`] that keeps every delivery in arrival order.
#[derive(Debug, Default)]
pub struct ResultBuffer {
    deliveries: Vec<(Ticket, Result<PathResult, PathError>)>,
}

impl ResultBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// The delivery for `ticket`, if it has arrived.
    pub fn get(&self, ticket: Ticket) -> Option<&Result<PathResult, PathError>> {
        self.deliveries
            .iter()
            .find(|(t, _)| *t == ticket)
            .map(|(_, outcome)| outcome)
    }

    /// Tickets in delivery order.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.deliveries.iter().map(|(t, _)| *t).collect()
    }

    /// Take all deliveries, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<(Ticket, Result<PathResult, PathError>)> {
        std::mem::take(&mut self.deliveries)
    }
}

impl ResultSink for ResultBuffer {
    fn deliver(&mut self, ticket: Ticket, outcome: Result<PathResult, PathError>) {
        self.deliveries.push((ticket, outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_empty_failure() {
        let r = PathResult::not_found();
        assert!(!r.success);
        assert!(r.is_empty());
        assert_eq!(r.cost, 0);
    }

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |t: Ticket, o: Result<PathResult, PathError>| seen.push((t, o.is_ok()));
            sink.deliver(Ticket(3), Ok(PathResult::not_found()));
            sink.deliver(Ticket(4), Err(PathError::Cancelled));
        }
        assert_eq!(seen, vec![(Ticket(3), true), (Ticket(4), false)]);
    }

    #[test]
    fn buffer_keeps_order() {
        let mut buf = ResultBuffer::new();
        buf.deliver(Ticket(2), Err(PathError::NoGrid));
        buf.deliver(Ticket(1), Ok(PathResult::not_found()));
        assert_eq!(buf.tickets(), vec![Ticket(2), Ticket(1)]);
        assert_eq!(buf.get(Ticket(2)), Some(&Err(PathError::NoGrid)));
        assert!(buf.get(Ticket(9)).is_none());
        assert_eq!(buf.drain().len(), 2);
        assert!(buf.is_empty());
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn path_result_round_trip() {
        let r = PathResult::found(
            vec![Vec2::new(-0.5, 0.5)],
            vec![Point::new(1, 2)],
            14,
        );
        let json = serde_json::to_string(&r).unwrap();
        let back: PathResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
