//! A* search over a [`NavGrid`], run as an explicit resumable state machine.
//!
//! ```text
//! Idle --begin--> Searching --step--> Succeeded | Failed --finish--> Idle
//! ```
//!
//! A search may be advanced a bounded number of expansions at a time with
//! [`Pathfinder::step`], so a scheduler can interleave it with other work, or
//! run to completion with [`Pathfinder::find_path`].
//!
//! Per-node costs and parent links live in a scratch table owned by the
//! pathfinder and tagged with a generation number. Starting a search bumps
//! the generation, which invalidates everything the previous (possibly
//! abandoned) search left behind without touching it.

use waygrid_core::{Point, Vec2};

use crate::error::PathError;
use crate::frontier::Frontier;
use crate::grid::NavGrid;
use crate::node::{NO_PARENT, NodeCosts, SearchNode};
use crate::result::PathResult;
use crate::traits::{Metric, Octile};

/// Where a [`Pathfinder`] is in its search lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// No search in progress.
    Idle,
    /// Frontier is being expanded.
    Searching,
    /// Target reached; the route can be collected with `finish`.
    Succeeded,
    /// Frontier exhausted without reaching the target.
    Failed,
}

impl SearchState {
    /// Whether the search has stopped and awaits `finish`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// The grid snapshot a running search was started against.
#[derive(Copy, Clone, Debug)]
struct ActiveSearch {
    grid: u64,
    start: usize,
    target: usize,
    revision: u64,
    nodes: usize,
}

impl ActiveSearch {
    /// Whether `grid` is the same grid, unedited, that the search began on.
    fn matches(&self, grid: &NavGrid) -> bool {
        grid.id() == self.grid && grid.revision() == self.revision && grid.len() == self.nodes
    }
}

/// Reusable A* search engine.
///
/// The pathfinder keeps its scratch buffers between searches, so repeated
/// queries on the same grid do not reallocate.
pub struct Pathfinder<M: Metric = Octile> {
    metric: M,
    scratch: Vec<SearchNode>,
    generation: u32,
    frontier: Frontier,
    nbuf: Vec<usize>,
    state: SearchState,
    search: Option<ActiveSearch>,
    expansions: usize,
}

impl Pathfinder<Octile> {
    /// A pathfinder using 8-directional octile costs.
    pub fn new() -> Self {
        Self::with_metric(Octile)
    }
}

impl Default for Pathfinder<Octile> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> Pathfinder<M> {
    /// A pathfinder using a custom cost model.
    pub fn with_metric(metric: M) -> Self {
        Self {
            metric,
            scratch: Vec::new(),
            generation: 0,
            frontier: Frontier::default(),
            nbuf: Vec::with_capacity(8),
            state: SearchState::Idle,
            search: None,
            expansions: 0,
        }
    }

    #[inline]
    pub fn metric(&self) -> &M {
        &self.metric
    }

    #[inline]
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Nodes expanded by the current or most recent search.
    #[inline]
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Costs the current or most recent search recorded for cell `p`, or
    /// `None` if that search never reached it.
    pub fn costs(&self, grid: &NavGrid, p: Point) -> Option<NodeCosts> {
        let i = grid.idx(p)?;
        let n = self.scratch.get(i)?;
        (self.generation != 0 && n.generation == self.generation).then(|| n.costs())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a search from `start` to `end`.
    ///
    /// Both positions are clamped into the grid; only non-finite positions
    /// fail to resolve. A blocked target (other than the start cell itself)
    /// fails the search immediately.
    pub fn begin(&mut self, grid: &NavGrid, start: Vec2, end: Vec2) -> Result<(), PathError> {
        if self.state != SearchState::Idle {
            return Err(PathError::Busy);
        }
        let start_idx = resolve(grid, start)?;
        let target_idx = resolve(grid, end)?;
        let start_p = grid.node_by_index(start_idx).pos();
        let target_p = grid.node_by_index(target_idx).pos();

        self.next_generation(grid.len());
        self.frontier.clear();
        self.expansions = 0;

        let h = self.metric.estimate(start_p, target_p);
        self.scratch[start_idx] = SearchNode {
            g: 0,
            h,
            parent: NO_PARENT,
            generation: self.generation,
            closed: false,
        };
        self.search = Some(ActiveSearch {
            grid: grid.id(),
            start: start_idx,
            target: target_idx,
            revision: grid.revision(),
            nodes: grid.len(),
        });

        if start_idx != target_idx && !grid.node_by_index(target_idx).is_walkable() {
            log::debug!("search {start_p} -> {target_p}: target is blocked");
            self.state = SearchState::Failed;
            return Ok(());
        }

        self.frontier.insert(start_idx, h, h);
        self.state = SearchState::Searching;
        log::debug!("search {start_p} -> {target_p} started");
        Ok(())
    }

    /// Expand at most `max_expansions` nodes (at least one) and report the
    /// resulting state.
    ///
    /// Stepping an idle or finished pathfinder does nothing. If `grid` is not
    /// the grid passed to [`begin`](Self::begin), or its walkability changed
    /// since, the search is abandoned and [`PathError::GridChanged`]
    /// returned.
    pub fn step(&mut self, grid: &NavGrid, max_expansions: usize) -> Result<SearchState, PathError> {
        if self.state != SearchState::Searching {
            return Ok(self.state);
        }
        let Some(search) = self.search else {
            self.state = SearchState::Idle;
            return Ok(self.state);
        };
        if !search.matches(grid) {
            log::warn!("grid changed under a running search; abandoning it");
            self.cancel();
            return Err(PathError::GridChanged);
        }

        let target_p = grid.node_by_index(search.target).pos();
        let generation = self.generation;
        let mut budget = max_expansions.max(1);
        let mut nbuf = std::mem::take(&mut self.nbuf);

        let outcome = loop {
            if budget == 0 {
                break SearchState::Searching;
            }
            let Some(current) = self.frontier.pop_min() else {
                break SearchState::Failed;
            };
            budget -= 1;
            self.expansions += 1;

            let ci = current.idx;
            self.scratch[ci].closed = true;
            if ci == search.target {
                break SearchState::Succeeded;
            }

            let current_g = self.scratch[ci].g;
            let cp = grid.node_by_index(ci).pos();

            nbuf.clear();
            grid.neighbor_indices(ci, &mut nbuf);

            for &ni in nbuf.iter() {
                let neighbor = grid.node_by_index(ni);
                if !neighbor.is_walkable() {
                    continue;
                }
                let np = neighbor.pos();
                let n = &mut self.scratch[ni];
                let seen = n.generation == generation;
                if seen && n.closed {
                    continue;
                }

                let tentative = current_g + self.metric.cost(cp, np);
                // Reached nodes that are not closed are always open.
                if seen && tentative >= n.g {
                    continue;
                }

                let h = self.metric.estimate(np, target_p);
                *n = SearchNode {
                    g: tentative,
                    h,
                    parent: ci,
                    generation,
                    closed: false,
                };
                let f = n.f();
                if seen {
                    self.frontier.update_priority(ni, f, h);
                } else {
                    self.frontier.insert(ni, f, h);
                }
            }
        };

        self.nbuf = nbuf;
        self.state = outcome;
        if outcome.is_terminal() {
            log::debug!(
                "search finished: {:?} after {} expansions",
                outcome,
                self.expansions
            );
        }
        Ok(outcome)
    }

    /// Step until the search reaches a terminal state.
    pub fn run(&mut self, grid: &NavGrid) -> Result<SearchState, PathError> {
        loop {
            let state = self.step(grid, usize::MAX)?;
            if state != SearchState::Searching {
                return Ok(state);
            }
        }
    }

    /// Collect the result of a finished search and return to `Idle`.
    pub fn finish(&mut self, grid: &NavGrid) -> Result<PathResult, PathError> {
        if !self.state.is_terminal() {
            return Err(PathError::NotFinished(self.state));
        }
        let Some(search) = self.search else {
            return Err(PathError::NotFinished(self.state));
        };
        if !search.matches(grid) {
            self.cancel();
            return Err(PathError::GridChanged);
        }
        let result = match self.state {
            SearchState::Succeeded => self.retrace(grid, search),
            _ => PathResult::not_found(),
        };
        self.state = SearchState::Idle;
        self.search = None;
        Ok(result)
    }

    /// Abandon the current search, if any. Nothing needs cleaning up: the
    /// next search starts from a fresh generation.
    pub fn cancel(&mut self) {
        if self.state == SearchState::Searching {
            log::debug!("search cancelled after {} expansions", self.expansions);
        }
        self.state = SearchState::Idle;
        self.search = None;
    }

    /// Compute the route from `start` to `end` in one go.
    pub fn find_path(&mut self, grid: &NavGrid, start: Vec2, end: Vec2) -> Result<PathResult, PathError> {
        self.begin(grid, start, end)?;
        self.run(grid)?;
        self.finish(grid)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Invalidate all scratch entries, resizing for a grid of `len` nodes.
    fn next_generation(&mut self, len: usize) {
        if self.scratch.len() != len {
            self.scratch.clear();
            self.scratch.resize(len, SearchNode::default());
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.scratch.fill(SearchNode::default());
            self.generation = 1;
        }
    }

    /// Follow parent links from the target back to (but excluding) the
    /// start, then reverse.
    fn retrace(&self, grid: &NavGrid, search: ActiveSearch) -> PathResult {
        let mut waypoints = Vec::new();
        let mut cells = Vec::new();
        let mut ci = search.target;
        while ci != search.start && ci != NO_PARENT {
            let node = grid.node_by_index(ci);
            waypoints.push(node.pivot_position());
            cells.push(node.pos());
            ci = self.scratch[ci].parent;
        }
        waypoints.reverse();
        cells.reverse();
        PathResult::found(waypoints, cells, self.scratch[search.target].g)
    }
}

fn resolve(grid: &NavGrid, world: Vec2) -> Result<usize, PathError> {
    let unresolvable = || PathError::Unresolvable { position: world };
    let node = grid.try_node_at(world).map_err(|_| unresolvable())?;
    grid.idx(node.pos()).ok_or_else(unresolvable)
}
