//! Grid cells ([`Node`]) and the per-search bookkeeping attached to them.

use waygrid_core::{Point, Vec2};

/// Parent sentinel: the node was reached from nowhere (it is the start, or
/// has not been reached).
pub(crate) const NO_PARENT: usize = usize::MAX;

/// One cell of a [`NavGrid`](crate::NavGrid).
///
/// Identity and positions are fixed when the grid is built; only walkability
/// changes afterwards, and only through the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pos: Point,
    walkable: bool,
    world_position: Vec2,
    pivot_position: Vec2,
}

impl Node {
    pub(crate) fn new(pos: Point, world_position: Vec2, pivot_position: Vec2) -> Self {
        Self {
            pos,
            walkable: true,
            world_position,
            pivot_position,
        }
    }

    /// Grid coordinates of the cell.
    #[inline]
    pub fn pos(&self) -> Point {
        self.pos
    }

    #[inline]
    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// World-space centre of the cell.
    #[inline]
    pub fn world_position(&self) -> Vec2 {
        self.world_position
    }

    /// World-space corner of the cell used as the waypoint anchor.
    #[inline]
    pub fn pivot_position(&self) -> Vec2 {
        self.pivot_position
    }

    /// Returns `true` if the walkability actually changed.
    #[inline]
    pub(crate) fn set_walkable(&mut self, walkable: bool) -> bool {
        let changed = self.walkable != walkable;
        self.walkable = walkable;
        changed
    }
}

/// Costs recorded for a node by the most recent search that reached it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NodeCosts {
    /// Accumulated cost from the start.
    pub g: i32,
    /// Heuristic estimate to the target.
    pub h: i32,
}

impl NodeCosts {
    /// Total estimated cost through this node.
    #[inline]
    pub fn f(&self) -> i32 {
        self.g + self.h
    }
}

// ---------------------------------------------------------------------------
// Per-search scratch
// ---------------------------------------------------------------------------

/// Search bookkeeping for one node, valid only while `generation` matches the
/// pathfinder's current generation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchNode {
    pub(crate) g: i32,
    pub(crate) h: i32,
    pub(crate) parent: usize,
    pub(crate) generation: u32,
    pub(crate) closed: bool,
}

impl SearchNode {
    #[inline]
    pub(crate) fn f(&self) -> i32 {
        self.g + self.h
    }

    #[inline]
    pub(crate) fn costs(&self) -> NodeCosts {
        NodeCosts {
            g: self.g,
            h: self.h,
        }
    }
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            g: 0,
            h: 0,
            parent: NO_PARENT,
            generation: 0,
            closed: false,
        }
    }
}
