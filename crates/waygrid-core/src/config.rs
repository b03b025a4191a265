//! Configuration for building a grid ([`GridConfig`]) and for driving
//! searches cooperatively ([`SchedulerConfig`]).

use std::fmt;

use crate::geom::{Point, Vec2};

/// Default number of node expansions one scheduler tick may perform.
pub const DEFAULT_EXPANSIONS_PER_TICK: usize = 64;

/// Largest number of cells a grid may have.
pub const MAX_GRID_CELLS: usize = 1 << 24;

// ---------------------------------------------------------------------------
// GridConfig
// ---------------------------------------------------------------------------

/// World-space layout of a walkability grid.
///
/// The grid covers the rectangle of size `bound_size` centred on `origin`.
/// `node_size` is the *radius* of one cell; cells are `2 * node_size` wide.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridConfig {
    pub origin: Vec2,
    pub bound_size: Vec2,
    pub node_size: f32,
}

impl GridConfig {
    /// Create a configuration from its three inputs.
    pub const fn new(origin: Vec2, bound_size: Vec2, node_size: f32) -> Self {
        Self {
            origin,
            bound_size,
            node_size,
        }
    }

    /// Width of one cell.
    #[inline]
    pub fn node_diameter(&self) -> f32 {
        self.node_size * 2.0
    }

    /// Number of cells along each axis, `bound_size / diameter` rounded half
    /// to even. Only meaningful for a configuration that passes
    /// [`validate`](Self::validate).
    pub fn dimensions(&self) -> Point {
        let d = self.node_diameter();
        Point::new(
            (self.bound_size.x / d).round_ties_even() as i32,
            (self.bound_size.y / d).round_ties_even() as i32,
        )
    }

    /// Check that the configuration describes a non-empty grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.is_finite() || !self.bound_size.is_finite() || !self.node_size.is_finite()
        {
            return Err(ConfigError::NonFinite);
        }
        if self.bound_size.x <= 0.0 || self.bound_size.y <= 0.0 {
            return Err(ConfigError::NonPositiveBounds(self.bound_size));
        }
        if self.node_size <= 0.0 {
            return Err(ConfigError::NonPositiveNodeSize(self.node_size));
        }
        let dims = self.dimensions();
        if dims.x < 1 || dims.y < 1 {
            return Err(ConfigError::EmptyGrid(dims));
        }
        // dimensions() saturates at i32::MAX, so the product fits in a u64.
        if dims.x as u64 * dims.y as u64 > MAX_GRID_CELLS as u64 {
            return Err(ConfigError::TooLarge(dims));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SchedulerConfig
// ---------------------------------------------------------------------------

/// Tuning for the cooperative path-request scheduler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Upper bound on nodes expanded by one tick. Zero is treated as one.
    pub expansions_per_tick: usize,
}

impl SchedulerConfig {
    /// The per-tick budget, never zero.
    #[inline]
    pub fn budget(&self) -> usize {
        self.expansions_per_tick.max(1)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            expansions_per_tick: DEFAULT_EXPANSIONS_PER_TICK,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Reasons a [`GridConfig`] cannot produce a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Origin, bounds or node size contain NaN or infinity.
    NonFinite,
    /// A bound component is zero or negative.
    NonPositiveBounds(Vec2),
    /// The node size is zero or negative.
    NonPositiveNodeSize(f32),
    /// The bounds round to zero cells on at least one axis.
    EmptyGrid(Point),
    /// The bounds hold more than [`MAX_GRID_CELLS`] cells.
    TooLarge(Point),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite => write!(f, "grid config contains a non-finite value"),
            Self::NonPositiveBounds(b) => {
                write!(f, "grid bounds must be positive, got ({}, {})", b.x, b.y)
            }
            Self::NonPositiveNodeSize(s) => write!(f, "node size must be positive, got {s}"),
            Self::EmptyGrid(dims) => write!(f, "grid bounds yield no cells: {dims}"),
            Self::TooLarge(dims) => write!(
                f,
                "grid of {} by {} cells exceeds the limit of {MAX_GRID_CELLS}",
                dims.x, dims.y
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
