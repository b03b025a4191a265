//! **waygrid-core**: shared types for the waygrid pathfinding engine.
//!
//! This crate provides the geometry primitives used across the workspace
//! (integer grid [`Point`]s and [`Range`]s, world-space [`Vec2`]s) and the
//! configuration that lays a grid over world space.

pub mod config;
pub mod geom;

pub use config::{ConfigError, DEFAULT_EXPANSIONS_PER_TICK, GridConfig, MAX_GRID_CELLS, SchedulerConfig};
pub use geom::{Point, Range, RangeIter, Vec2};
