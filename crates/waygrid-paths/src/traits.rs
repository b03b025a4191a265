use waygrid_core::{Point, Vec2};

use crate::distance;

/// Movement cost model for the A* search.
pub trait Metric {
    /// Cost of moving from `from` to the adjacent cell `to`. Must be > 0.
    fn cost(&self, from: Point, to: Point) -> i32;

    /// Heuristic estimate of the cost from `from` to `to`.
    /// Must never overestimate the true cost (admissible).
    fn estimate(&self, from: Point, to: Point) -> i32;
}

/// 8-directional movement: 10 per orthogonal step, 14 per diagonal, with the
/// same octile formula as the heuristic.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Octile;

impl Metric for Octile {
    #[inline]
    fn cost(&self, from: Point, to: Point) -> i32 {
        distance::octile(from, to)
    }

    #[inline]
    fn estimate(&self, from: Point, to: Point) -> i32 {
        distance::octile(from, to)
    }
}

/// Something that can report where the pointer currently is in world space.
///
/// The grid never talks to input or rendering systems; callers hand it a
/// `PointerSource` and it asks for a position when it needs one.
pub trait PointerSource {
    fn pointer_position(&self) -> Vec2;
}

impl PointerSource for Vec2 {
    fn pointer_position(&self) -> Vec2 {
        *self
    }
}

impl<F: Fn() -> Vec2> PointerSource for F {
    fn pointer_position(&self) -> Vec2 {
        self()
    }
}
