use std::fmt;

use waygrid_core::{ConfigError, Point, Range, Vec2};

use crate::pathfinder::SearchState;

/// Errors raised by grid construction and walkability edits.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// The grid configuration is unusable. Fatal for grid setup.
    Config(ConfigError),
    /// An edit rectangle reaches past the grid edge.
    RegionOutOfBounds { region: Range, bounds: Range },
    /// An edit rectangle with a zero or negative extent.
    EmptyRegion { size: Point },
    /// A world position with NaN or infinite coordinates.
    NonFinitePosition(Vec2),
    /// No grid has been installed yet.
    NotBuilt,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid grid configuration: {e}"),
            Self::RegionOutOfBounds { region, bounds } => {
                write!(f, "region {region} extends beyond grid bounds {bounds}")
            }
            Self::EmptyRegion { size } => write!(f, "region size {size} covers no cells"),
            Self::NonFinitePosition(p) => {
                write!(f, "world position ({}, {}) is not finite", p.x, p.y)
            }
            Self::NotBuilt => write!(f, "grid has not been built"),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for GridError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors that stop a path request from producing a result.
///
/// "No path exists" is *not* one of these; it is a successful search with
/// [`PathResult::success`](crate::PathResult::success) set to `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// A start or end position cannot be mapped to a cell.
    Unresolvable { position: Vec2 },
    /// The request arrived before any grid was installed.
    NoGrid,
    /// A search is already in progress.
    Busy,
    /// The result was requested before the search reached a terminal state.
    NotFinished(SearchState),
    /// The grid's walkability or shape changed while the search was running.
    GridChanged,
    /// The request was abandoned by its owner.
    Cancelled,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable { position } => write!(
                f,
                "cannot resolve world position ({}, {}) to a grid cell",
                position.x, position.y
            ),
            Self::NoGrid => write!(f, "no grid to search"),
            Self::Busy => write!(f, "a search is already in progress"),
            Self::NotFinished(state) => write!(f, "search has not finished (state: {state:?})"),
            Self::GridChanged => write!(f, "grid changed during the search"),
            Self::Cancelled => write!(f, "path request was cancelled"),
        }
    }
}

impl std::error::Error for PathError {}
