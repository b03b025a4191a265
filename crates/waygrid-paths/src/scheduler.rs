//! The cooperative request loop: [`PathScheduler`], [`TickStatus`],
//! [`EditOutcome`].
//!
//! The scheduler owns the grid and a single [`Pathfinder`]. Requests are
//! queued and served one at a time; each call to [`PathScheduler::tick`]
//! advances the active search by a bounded number of expansions, so the
//! host loop stays responsive. Walkability edits submitted while a search
//! is running are held back until it terminates, so a search always sees
//! the grid it started on.

use std::collections::VecDeque;

use waygrid_core::{Point, Range, SchedulerConfig, Vec2};

use crate::error::{GridError, PathError};
use crate::grid::NavGrid;
use crate::pathfinder::Pathfinder;
use crate::request::{PathRequest, RequestQueue, Ticket};
use crate::result::{PathResult, ResultSink};

/// Whether the scheduler has work left after a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing queued, running or awaiting delivery.
    Idle,
    /// More ticks are needed.
    Busy,
}

/// What happened to a walkability edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The grid was updated immediately.
    Applied,
    /// A search is running; the edit is applied when it terminates.
    Deferred,
}

/// What [`PathScheduler::install_grid`] did.
#[derive(Debug)]
pub struct GridSwap {
    /// The grid that was replaced.
    pub previous: Option<NavGrid>,
    /// Deferred edits that no longer fit on the new grid, with the reason.
    /// Every other deferred edit has been applied to it.
    pub rejected_edits: Vec<(Range, GridError)>,
}

/// An edit held back while a search runs.
#[derive(Copy, Clone, Debug)]
struct DeferredEdit {
    anchor: Vec2,
    size: Point,
    /// Cells covered on the grid the edit was validated against.
    region: Range,
    walkable: bool,
}

type Delivery = (Ticket, Result<PathResult, PathError>);

/// Single-threaded driver that serialises path requests over one grid.
pub struct PathScheduler {
    config: SchedulerConfig,
    grid: Option<NavGrid>,
    pathfinder: Pathfinder,
    queue: RequestQueue,
    active: Option<PathRequest>,
    deferred: Vec<DeferredEdit>,
    outbox: VecDeque<Delivery>,
    next_ticket: u64,
}

impl PathScheduler {
    /// A scheduler with no grid. Requests fail with [`PathError::NoGrid`]
    /// until one is installed.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            grid: None,
            pathfinder: Pathfinder::new(),
            queue: RequestQueue::new(),
            active: None,
            deferred: Vec::new(),
            outbox: VecDeque::new(),
            next_ticket: 0,
        }
    }

    /// A scheduler serving requests over `grid`.
    pub fn with_grid(config: SchedulerConfig, grid: NavGrid) -> Self {
        let mut s = Self::new(config);
        s.grid = Some(grid);
        s
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[inline]
    pub fn grid(&self) -> Option<&NavGrid> {
        self.grid.as_ref()
    }

    #[inline]
    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Replace the grid.
    ///
    /// A running search is abandoned and its requester receives
    /// [`PathError::GridChanged`]. Deferred edits are resolved again from
    /// their world anchors and applied to the new grid; the ones that do not
    /// fit are handed back in [`GridSwap::rejected_edits`].
    pub fn install_grid(&mut self, grid: NavGrid) -> GridSwap {
        if let Some(req) = self.active.take() {
            log::warn!("grid replaced during search {}; abandoning it", req.ticket);
            self.pathfinder.cancel();
            self.outbox.push_back((req.ticket, Err(PathError::GridChanged)));
        }
        let previous = self.grid.replace(grid);
        let mut rejected_edits = Vec::new();
        if let Some(grid) = self.grid.as_mut() {
            for edit in self.deferred.drain(..) {
                if let Err(e) = grid.set_walkable(edit.anchor, edit.size, edit.walkable) {
                    log::warn!("deferred edit {} does not fit the new grid: {e}", edit.region);
                    rejected_edits.push((edit.region, e));
                }
            }
        }
        GridSwap {
            previous,
            rejected_edits,
        }
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Queue a request for a route from `start` to `end`.
    pub fn request(&mut self, start: Vec2, end: Vec2) -> Ticket {
        self.request_with_priority(start, end, 0)
    }

    /// Queue a request at `rank`. Lower ranks are served first; equal ranks
    /// in submission order.
    pub fn request_with_priority(&mut self, start: Vec2, end: Vec2, rank: i32) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.queue.push(PathRequest { ticket, start, end }, rank);
        log::trace!("request {ticket} queued at rank {rank}");
        ticket
    }

    /// Withdraw a request. Its requester receives [`PathError::Cancelled`]
    /// on the next tick.
    ///
    /// Returns `false` if the ticket is unknown or was already delivered.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        if self.queue.remove(ticket).is_some() {
            self.outbox.push_back((ticket, Err(PathError::Cancelled)));
            return true;
        }
        if self.active.is_some_and(|r| r.ticket == ticket) {
            self.active = None;
            self.pathfinder.cancel();
            self.outbox.push_back((ticket, Err(PathError::Cancelled)));
            return true;
        }
        false
    }

    /// Requests not yet delivered, including the running one.
    pub fn pending(&self) -> usize {
        self.queue.len() + usize::from(self.active.is_some())
    }

    /// Edits waiting for the running search to end.
    pub fn deferred_edits(&self) -> usize {
        self.deferred.len()
    }

    /// Whether there is nothing left to run or deliver.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty() && self.outbox.is_empty()
    }

    // -----------------------------------------------------------------------
    // Loop
    // -----------------------------------------------------------------------

    /// Run one cooperative slice.
    ///
    /// Pending deliveries go out first. Then a finished search is delivered,
    /// a running one is advanced, or the next queued request is started.
    /// A search that terminates during a tick is delivered on the following
    /// one.
    pub fn tick(&mut self, sink: &mut impl ResultSink) -> TickStatus {
        while let Some((ticket, outcome)) = self.outbox.pop_front() {
            sink.deliver(ticket, outcome);
        }

        match self.active {
            Some(req) if self.pathfinder.state().is_terminal() => {
                self.active = None;
                let outcome = match self.grid.as_ref() {
                    Some(grid) => self.pathfinder.finish(grid),
                    None => Err(PathError::NoGrid),
                };
                if let Ok(r) = &outcome {
                    log::debug!(
                        "request {} done: success={} cost={} waypoints={}",
                        req.ticket,
                        r.success,
                        r.cost,
                        r.len()
                    );
                }
                sink.deliver(req.ticket, outcome);
                self.apply_deferred();
            }
            Some(req) => self.advance(req, sink),
            None => {
                self.apply_deferred();
                if let Some(req) = self.queue.pop() {
                    self.start(req, sink);
                }
            }
        }

        if self.is_idle() {
            TickStatus::Idle
        } else {
            TickStatus::Busy
        }
    }

    /// Tick until idle, returning the number of ticks taken.
    pub fn run_until_idle(&mut self, sink: &mut impl ResultSink) -> usize {
        let mut ticks = 0;
        while !self.is_idle() {
            self.tick(sink);
            ticks += 1;
        }
        ticks
    }

    fn start(&mut self, req: PathRequest, sink: &mut impl ResultSink) {
        let Some(grid) = self.grid.as_ref() else {
            sink.deliver(req.ticket, Err(PathError::NoGrid));
            return;
        };
        match self.pathfinder.begin(grid, req.start, req.end) {
            Ok(()) => {
                self.active = Some(req);
                self.advance(req, sink);
            }
            Err(e) => {
                log::debug!("request {} rejected: {e}", req.ticket);
                sink.deliver(req.ticket, Err(e));
            }
        }
    }

    fn advance(&mut self, req: PathRequest, sink: &mut impl ResultSink) {
        let step = match self.grid.as_ref() {
            Some(grid) => self.pathfinder.step(grid, self.config.budget()),
            None => Err(PathError::NoGrid),
        };
        if let Err(e) = step {
            self.pathfinder.cancel();
            self.active = None;
            sink.deliver(req.ticket, Err(e));
            self.apply_deferred();
        }
    }

    fn apply_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let Some(grid) = self.grid.as_mut() else {
            self.deferred.clear();
            return;
        };
        log::debug!("applying {} deferred edits", self.deferred.len());
        for edit in self.deferred.drain(..) {
            if let Err(e) = grid.set_region_walkable(edit.region, edit.walkable) {
                log::warn!("deferred edit {} failed: {e}", edit.region);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Obstacles
    // -----------------------------------------------------------------------

    /// Set the walkability of the `size` block anchored at `anchor`.
    ///
    /// The block is validated against the grid straight away. It is applied
    /// immediately when no search is running, and otherwise when the running
    /// search terminates.
    pub fn set_walkable(&mut self, anchor: Vec2, size: Point, walkable: bool) -> Result<EditOutcome, GridError> {
        let grid = self.grid.as_mut().ok_or(GridError::NotBuilt)?;
        let region = grid.region(anchor, size)?;
        if self.active.is_some() {
            log::debug!("deferring edit {region} until the running search ends");
            self.deferred.push(DeferredEdit {
                anchor,
                size,
                region,
                walkable,
            });
            return Ok(EditOutcome::Deferred);
        }
        grid.set_region_walkable(region, walkable)?;
        Ok(EditOutcome::Applied)
    }

    /// Whether the `size` block anchored at `anchor` is inside the grid and
    /// entirely walkable once every accepted edit, deferred ones included,
    /// has been applied.
    pub fn region_is_clear(&self, anchor: Vec2, size: Point) -> bool {
        let Some(grid) = self.grid.as_ref() else {
            return false;
        };
        if self.deferred.is_empty() {
            return grid.region_is_clear(anchor, size);
        }
        let Ok(region) = grid.region(anchor, size) else {
            return false;
        };
        match region.iter().find(|&p| !self.walkable_after_edits(grid, p)) {
            Some(p) => {
                log::trace!("region {region} obstructed at {p} once deferred edits land");
                false
            }
            None => true,
        }
    }

    /// Walkability of `p` after the deferred edits; the latest edit covering
    /// a cell wins.
    fn walkable_after_edits(&self, grid: &NavGrid, p: Point) -> bool {
        self.deferred
            .iter()
            .rev()
            .find(|e| e.region.contains(p))
            .map_or_else(|| grid.is_walkable(p), |e| e.walkable)
    }
}

impl Default for PathScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinder::SearchState;
    use crate::result::ResultBuffer;

    fn scheduler(w: i32, h: i32, budget: usize) -> PathScheduler {
        let grid = NavGrid::build(Vec2::ZERO, Vec2::new(w as f32, h as f32), 0.5).unwrap();
        PathScheduler::with_grid(
            SchedulerConfig {
                expansions_per_tick: budget,
            },
            grid,
        )
    }

    fn at(s: &PathScheduler, x: i32, y: i32) -> Vec2 {
        s.grid().unwrap().node(Point::new(x, y)).unwrap().world_position()
    }

    #[test]
    fn serves_requests_in_order() {
        let mut s = scheduler(6, 6, 64);
        let a = s.request(at(&s, 0, 0), at(&s, 5, 5));
        let b = s.request(at(&s, 5, 0), at(&s, 0, 5));
        let c = s.request(at(&s, 2, 2), at(&s, 2, 2));
        assert_eq!(s.pending(), 3);

        let mut buf = ResultBuffer::new();
        assert!(s.run_until_idle(&mut buf) > 0);
        assert_eq!(buf.tickets(), vec![a, b, c]);
        assert_eq!(buf.get(a).unwrap().as_ref().map(|r| r.cost), Ok(70));
        assert_eq!(buf.get(c).unwrap().as_ref().map(|r| r.is_empty()), Ok(true));
        assert!(s.is_idle());
        assert_eq!(s.pending(), 0);
        assert_eq!(s.run_until_idle(&mut buf), 0);
    }

    #[test]
    fn lower_rank_jumps_the_queue() {
        let mut s = scheduler(5, 5, 64);
        let a = s.request(at(&s, 0, 0), at(&s, 4, 4));
        let b = s.request_with_priority(at(&s, 4, 4), at(&s, 0, 0), -1);
        let mut buf = ResultBuffer::new();
        s.run_until_idle(&mut buf);
        assert_eq!(buf.tickets(), vec![b, a]);
    }

    #[test]
    fn delivery_waits_one_tick_after_completion() {
        let mut s = scheduler(5, 5, 64);
        let t = s.request(at(&s, 0, 0), at(&s, 4, 4));
        let mut buf = ResultBuffer::new();

        assert_eq!(s.tick(&mut buf), TickStatus::Busy);
        assert_eq!(s.pathfinder().state(), SearchState::Succeeded);
        assert!(buf.is_empty());

        assert_eq!(s.tick(&mut buf), TickStatus::Idle);
        let r = buf.get(t).unwrap().as_ref().unwrap();
        assert!(r.success);
        assert_eq!(r.cost, 56);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn search_is_spread_over_ticks() {
        let mut s = scheduler(10, 10, 2);
        s.request(at(&s, 0, 0), at(&s, 9, 9));
        let mut buf = ResultBuffer::new();
        // 10 expansions at 2 per tick, then one tick to deliver.
        assert_eq!(s.run_until_idle(&mut buf), 6);
        assert_eq!(s.pathfinder().expansions(), 10);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn edits_during_a_search_are_deferred() {
        let mut s = scheduler(10, 10, 1);
        let t = s.request(at(&s, 0, 5), at(&s, 9, 5));
        let mut buf = ResultBuffer::new();
        s.tick(&mut buf);
        assert_eq!(s.pathfinder().state(), SearchState::Searching);

        let wall = s.set_walkable(at(&s, 5, 0), Point::new(1, 10), false);
        assert_eq!(wall, Ok(EditOutcome::Deferred));
        assert_eq!(s.deferred_edits(), 1);
        assert!(!s.region_is_clear(at(&s, 5, 0), Point::new(1, 10)));
        assert!(s.grid().unwrap().is_walkable(Point::new(5, 5)));

        s.run_until_idle(&mut buf);
        // The search ran against the grid it started on.
        assert!(buf.get(t).unwrap().as_ref().unwrap().success);
        assert_eq!(s.deferred_edits(), 0);
        assert!(!s.region_is_clear(at(&s, 5, 0), Point::new(1, 1)));

        let t = s.request(at(&s, 0, 5), at(&s, 9, 5));
        s.run_until_idle(&mut buf);
        assert!(!buf.get(t).unwrap().as_ref().unwrap().success);

        let opened = s.set_walkable(at(&s, 5, 5), Point::new(1, 1), true);
        assert_eq!(opened, Ok(EditOutcome::Applied));
        assert!(s.region_is_clear(at(&s, 5, 5), Point::new(1, 1)));
    }

    #[test]
    fn deferred_edits_count_when_checking_placement() {
        let mut s = scheduler(10, 10, 1);
        s.request(at(&s, 0, 0), at(&s, 9, 9));
        let mut buf = ResultBuffer::new();
        s.tick(&mut buf);

        // Check-then-place twice on the same cells during one search.
        let anchor = at(&s, 6, 2);
        assert!(s.region_is_clear(anchor, Point::new(2, 2)));
        assert_eq!(s.set_walkable(anchor, Point::new(2, 2), false), Ok(EditOutcome::Deferred));
        assert!(!s.region_is_clear(anchor, Point::new(2, 2)));
        assert!(!s.region_is_clear(at(&s, 7, 3), Point::new(1, 1)));
        assert!(s.region_is_clear(at(&s, 8, 2), Point::new(2, 2)));

        // A later edit that reopens a cell wins over the earlier one.
        assert_eq!(s.set_walkable(anchor, Point::new(1, 1), true), Ok(EditOutcome::Deferred));
        assert!(s.region_is_clear(anchor, Point::new(1, 1)));
        assert!(!s.region_is_clear(anchor, Point::new(2, 1)));

        s.run_until_idle(&mut buf);
        assert!(s.region_is_clear(anchor, Point::new(1, 1)));
        assert!(!s.region_is_clear(at(&s, 7, 2), Point::new(1, 2)));
    }

    #[test]
    fn invalid_edits_are_rejected_immediately() {
        let mut s = scheduler(5, 5, 1);
        s.request(at(&s, 0, 0), at(&s, 4, 4));
        let mut buf = ResultBuffer::new();
        s.tick(&mut buf);
        let err = s.set_walkable(at(&s, 4, 4), Point::new(2, 2), false);
        assert!(matches!(err, Err(GridError::RegionOutOfBounds { .. })));
        assert_eq!(s.deferred_edits(), 0);
    }

    #[test]
    fn cancelling_a_queued_request() {
        let mut s = scheduler(5, 5, 64);
        let a = s.request(at(&s, 0, 0), at(&s, 4, 4));
        let b = s.request(at(&s, 0, 4), at(&s, 4, 0));
        assert!(s.cancel(b));
        assert!(!s.cancel(b));

        let mut buf = ResultBuffer::new();
        s.run_until_idle(&mut buf);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.get(b), Some(&Err(PathError::Cancelled)));
        assert!(buf.get(a).unwrap().is_ok());
    }

    #[test]
    fn cancelling_the_running_request() {
        let mut s = scheduler(10, 10, 1);
        let a = s.request(at(&s, 0, 0), at(&s, 9, 9));
        let b = s.request(at(&s, 9, 0), at(&s, 0, 9));
        let mut buf = ResultBuffer::new();
        s.tick(&mut buf);
        assert_eq!(s.pending(), 2);

        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(s.pathfinder().state(), SearchState::Idle);

        s.run_until_idle(&mut buf);
        assert_eq!(buf.tickets(), vec![a, b]);
        assert_eq!(buf.get(a), Some(&Err(PathError::Cancelled)));
        assert_eq!(buf.get(b).unwrap().as_ref().map(|r| r.cost), Ok(126));
    }

    #[test]
    fn no_grid_fails_requests_and_edits() {
        let mut s = PathScheduler::default();
        assert!(s.grid().is_none());
        let t = s.request(Vec2::ZERO, Vec2::ONE);
        let mut buf = ResultBuffer::new();
        s.run_until_idle(&mut buf);
        assert_eq!(buf.get(t), Some(&Err(PathError::NoGrid)));
        assert_eq!(
            s.set_walkable(Vec2::ZERO, Point::new(1, 1), false),
            Err(GridError::NotBuilt)
        );
        assert!(!s.region_is_clear(Vec2::ZERO, Point::new(1, 1)));

        let grid = NavGrid::build(Vec2::ZERO, Vec2::new(4.0, 4.0), 0.5).unwrap();
        let swap = s.install_grid(grid);
        assert!(swap.previous.is_none());
        assert!(swap.rejected_edits.is_empty());
        let t = s.request(Vec2::ZERO, Vec2::ONE);
        s.run_until_idle(&mut buf);
        assert!(buf.get(t).unwrap().is_ok());
    }

    #[test]
    fn replacing_the_grid_abandons_the_search() {
        let mut s = scheduler(10, 10, 1);
        let t = s.request(at(&s, 0, 0), at(&s, 9, 9));
        let mut buf = ResultBuffer::new();
        s.tick(&mut buf);
        s.set_walkable(at(&s, 3, 3), Point::new(2, 2), false).unwrap();
        s.set_walkable(at(&s, 8, 8), Point::new(2, 2), false).unwrap();

        // 3x3 grid: the first block lands on (0, 0)-(2, 2), the second
        // clamps to (2, 2) and overhangs the edge.
        let grid = NavGrid::build(Vec2::ZERO, Vec2::new(3.0, 3.0), 0.5).unwrap();
        let swap = s.install_grid(grid);
        assert_eq!(swap.previous.map(|g| g.size()), Some(Point::new(10, 10)));
        assert_eq!(swap.rejected_edits.len(), 1);
        assert_eq!(swap.rejected_edits[0].0, Range::new(8, 8, 10, 10));
        assert!(matches!(
            swap.rejected_edits[0].1,
            GridError::RegionOutOfBounds { .. }
        ));
        assert_eq!(s.deferred_edits(), 0);

        s.run_until_idle(&mut buf);
        assert_eq!(buf.get(t), Some(&Err(PathError::GridChanged)));
        assert_eq!(s.grid().map(|g| g.walkable_count()), Some(5));
    }

    #[test]
    fn bad_request_does_not_disturb_the_next() {
        let mut s = scheduler(5, 5, 64);
        let bad = s.request(Vec2::new(f32::NAN, 0.0), Vec2::ZERO);
        let good = s.request(at(&s, 0, 0), at(&s, 4, 0));
        let mut buf = ResultBuffer::new();
        s.run_until_idle(&mut buf);
        assert!(matches!(
            buf.get(bad),
            Some(Err(PathError::Unresolvable { .. }))
        ));
        assert_eq!(buf.get(good).unwrap().as_ref().map(|r| r.cost), Ok(40));
    }

    #[test]
    fn closure_sink_sees_each_ticket_once() {
        let mut s = scheduler(8, 8, 3);
        let tickets: Vec<_> = (0..8)
            .map(|i| s.request(at(&s, i, 0), at(&s, 7 - i, 7)))
            .collect();
        s.cancel(tickets[3]);
        let mut seen = Vec::new();
        s.run_until_idle(&mut |t: Ticket, _: Result<PathResult, PathError>| seen.push(t));
        seen.sort();
        assert_eq!(seen, tickets);
    }
}
