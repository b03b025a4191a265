//! A* pathfinding over walkability grids laid out in world space.
//!
//! - [`NavGrid`] maps world positions to cells and holds per-cell
//!   walkability, edited in rectangular blocks.
//! - [`Pathfinder`] runs an 8-directional A* search as a resumable state
//!   machine, reusing its scratch buffers between searches.
//! - [`PathScheduler`] queues requests, advances one search a bounded amount
//!   per [`tick`](PathScheduler::tick), defers edits that arrive mid-search,
//!   and hands every request exactly one outcome through a [`ResultSink`].
//!
//! # Quick start
//!
//! ```
//! use waygrid_paths::{NavGrid, Pathfinder, Point, Vec2};
//!
//! let mut grid = NavGrid::build(Vec2::ZERO, Vec2::new(5.0, 5.0), 0.5).unwrap();
//! grid.set_walkable_at(Point::new(2, 2), false).unwrap();
//!
//! let mut pf = Pathfinder::new();
//! let route = pf
//!     .find_path(&grid, Vec2::new(-2.0, -2.0), Vec2::new(2.0, 2.0))
//!     .unwrap();
//! assert!(route.success);
//! assert!(!route.cells.contains(&Point::new(2, 2)));
//! ```
//!
//! # Costs
//!
//! Orthogonal steps cost [`ORTHOGONAL_COST`], diagonal steps
//! [`DIAGONAL_COST`]; the heuristic is the matching octile distance. Custom
//! models plug in through [`Metric`].

mod distance;
mod error;
mod frontier;
mod grid;
mod node;
mod pathfinder;
mod request;
mod result;
mod scheduler;
mod traits;

pub use distance::{DIAGONAL_COST, ORTHOGONAL_COST, octile};
pub use error::{GridError, PathError};
pub use frontier::{Frontier, FrontierEntry};
pub use grid::NavGrid;
pub use node::{Node, NodeCosts};
pub use pathfinder::{Pathfinder, SearchState};
pub use request::{PathRequest, RequestQueue, Ticket};
pub use result::{PathResult, ResultBuffer, ResultSink};
pub use scheduler::{EditOutcome, GridSwap, PathScheduler, TickStatus};
pub use traits::{Metric, Octile, PointerSource};

pub use waygrid_core::{ConfigError, GridConfig, Point, Range, SchedulerConfig, Vec2};
