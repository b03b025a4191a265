//! The [`NavGrid`] type: a fixed 2D array of [`Node`]s laid over a
//! rectangle of world space.
//!
//! World positions are resolved to cells by clamping into the grid bounds,
//! so every position maps to *some* cell. Walkability is edited in
//! rectangular blocks; edits that would reach past the grid edge are
//! rejected rather than clamped.

use std::sync::atomic::{AtomicU64, Ordering};

use waygrid_core::{GridConfig, Point, Range, Vec2};

use crate::error::GridError;
use crate::node::Node;
use crate::traits::PointerSource;

/// Source of grid identities; every built or cloned grid takes a fresh one.
static NEXT_GRID_ID: AtomicU64 = AtomicU64::new(0);

fn next_grid_id() -> u64 {
    NEXT_GRID_ID.fetch_add(1, Ordering::Relaxed)
}

/// A walkability grid anchored in world space.
#[derive(Debug)]
pub struct NavGrid {
    id: u64,
    config: GridConfig,
    width: i32,
    height: i32,
    /// Row-major: index = y * width + x.
    nodes: Vec<Node>,
    /// Bumped whenever the walkability of at least one node changes.
    revision: u64,
}

impl NavGrid {
    /// Build a grid from a validated configuration. All nodes start walkable.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let dims = config.dimensions();
        let (width, height) = (dims.x, dims.y);
        let r = config.node_size;
        let d = config.node_diameter();
        let bottom_left = config.origin - config.bound_size * 0.5;

        let mut nodes = Vec::with_capacity(width as usize * height as usize);
        for j in 0..height {
            for i in 0..width {
                let centre = bottom_left + Vec2::new(i as f32 * d + r, j as f32 * d + r);
                let pivot = centre - Vec2::splat(r);
                nodes.push(Node::new(Point::new(i, j), centre, pivot));
            }
        }

        log::debug!(
            "built {}x{} grid at ({}, {}) with cell diameter {}",
            width,
            height,
            config.origin.x,
            config.origin.y,
            d
        );

        Ok(Self {
            id: next_grid_id(),
            config,
            width,
            height,
            nodes,
            revision: 0,
        })
    }

    /// Shorthand for [`NavGrid::new`] from the three layout inputs.
    pub fn build(origin: Vec2, bound_size: Vec2, node_size: f32) -> Result<Self, GridError> {
        Self::new(GridConfig::new(origin, bound_size, node_size))
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Size of the grid in cells.
    #[inline]
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    /// The range of valid cell coordinates.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false` for a successfully built grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.config.origin
    }

    #[inline]
    pub fn bound_size(&self) -> Vec2 {
        self.config.bound_size
    }

    /// Cell radius.
    #[inline]
    pub fn node_size(&self) -> f32 {
        self.config.node_size
    }

    #[inline]
    pub fn node_diameter(&self) -> f32 {
        self.config.node_diameter()
    }

    /// Identity of this grid instance. Clones get their own.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Walkability revision. Equal revisions on the same grid mean equal
    /// walkability.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Node access
    // -----------------------------------------------------------------------

    /// Flat index of `p`, or `None` if out of bounds.
    #[inline]
    pub(crate) fn idx(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return None;
        }
        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    /// The node at grid coordinates `p`.
    #[inline]
    pub fn node(&self, p: Point) -> Option<&Node> {
        self.idx(p).map(|i| &self.nodes[i])
    }

    /// All nodes in row-major order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub(crate) fn node_by_index(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Whether `p` is inside the grid and walkable.
    #[inline]
    pub fn is_walkable(&self, p: Point) -> bool {
        self.node(p).is_some_and(Node::is_walkable)
    }

    /// Number of walkable nodes.
    pub fn walkable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_walkable()).count()
    }

    // -----------------------------------------------------------------------
    // World <-> grid
    // -----------------------------------------------------------------------

    /// Grid coordinates of the cell covering `world`.
    ///
    /// Positions outside the bounds are clamped to the nearest edge cell, so
    /// this never fails; far-away positions therefore resolve to edge cells
    /// that may be nowhere near them. NaN coordinates resolve to the lower
    /// edge.
    pub fn point_at(&self, world: Vec2) -> Point {
        let min = self.config.origin - self.config.bound_size * 0.5;
        Point::new(
            axis_index(world.x, min.x, self.config.bound_size.x, self.width),
            axis_index(world.y, min.y, self.config.bound_size.y, self.height),
        )
    }

    /// The node covering `world`, clamped into the grid (see
    /// [`point_at`](Self::point_at)).
    pub fn node_at(&self, world: Vec2) -> &Node {
        let p = self.point_at(world);
        // point_at always yields in-bounds coordinates
        &self.nodes[p.y as usize * self.width as usize + p.x as usize]
    }

    /// Like [`node_at`](Self::node_at) but rejects NaN or infinite input.
    pub fn try_node_at(&self, world: Vec2) -> Result<&Node, GridError> {
        if !world.is_finite() {
            return Err(GridError::NonFinitePosition(world));
        }
        Ok(self.node_at(world))
    }

    // -----------------------------------------------------------------------
    // Neighbours
    // -----------------------------------------------------------------------

    /// The in-bounds nodes of the 3×3 block around `node`, excluding it.
    ///
    /// Diagonal neighbours are returned even when both orthogonal cells
    /// between them are blocked.
    pub fn neighbors(&self, node: &Node) -> Vec<&Node> {
        node.pos()
            .neighbors_8()
            .into_iter()
            .filter_map(|p| self.node(p))
            .collect()
    }

    /// Append the flat indices of the in-bounds neighbours of `idx` to `buf`.
    pub(crate) fn neighbor_indices(&self, idx: usize, buf: &mut Vec<usize>) {
        let p = self.nodes[idx].pos();
        buf.extend(p.neighbors_8().into_iter().filter_map(|n| self.idx(n)));
    }

    // -----------------------------------------------------------------------
    // Region queries and edits
    // -----------------------------------------------------------------------

    /// The block of `size` cells whose lower-left cell covers `anchor`.
    ///
    /// Fails if the block is empty or reaches past the grid edge.
    pub fn region(&self, anchor: Vec2, size: Point) -> Result<Range, GridError> {
        let start = self.try_node_at(anchor)?.pos();
        self.check_region(Range::with_size(start, size))
    }

    fn check_region(&self, region: Range) -> Result<Range, GridError> {
        if region.is_empty() {
            return Err(GridError::EmptyRegion {
                size: region.size(),
            });
        }
        if !region.in_range(self.bounds()) {
            return Err(GridError::RegionOutOfBounds {
                region,
                bounds: self.bounds(),
            });
        }
        Ok(region)
    }

    /// Whether every cell of `region` exists and is walkable.
    pub fn region_clear(&self, region: Range) -> bool {
        if let Err(e) = self.check_region(region) {
            log::trace!("region check rejected: {e}");
            return false;
        }
        match region.iter().find(|&p| !self.is_walkable(p)) {
            Some(p) => {
                log::trace!("region {region} obstructed at {p}");
                false
            }
            None => true,
        }
    }

    /// Whether the `size` block anchored at `anchor` lies inside the grid and
    /// is entirely walkable.
    pub fn region_is_clear(&self, anchor: Vec2, size: Point) -> bool {
        match self.region(anchor, size) {
            Ok(region) => self.region_clear(region),
            Err(e) => {
                log::trace!("region check rejected: {e}");
                false
            }
        }
    }

    /// Set the walkability of every cell in `region`.
    ///
    /// Returns the number of cells whose walkability changed.
    pub fn set_region_walkable(&mut self, region: Range, walkable: bool) -> Result<usize, GridError> {
        let region = self.check_region(region)?;
        let mut changed = 0;
        for p in region {
            if let Some(i) = self.idx(p) {
                if self.nodes[i].set_walkable(walkable) {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            self.revision += 1;
        }
        Ok(changed)
    }

    /// Set the walkability of the `size` block anchored at `anchor`,
    /// returning the cells touched.
    pub fn set_walkable(&mut self, anchor: Vec2, size: Point, walkable: bool) -> Result<Range, GridError> {
        let region = self.region(anchor, size)?;
        self.set_region_walkable(region, walkable)?;
        Ok(region)
    }

    /// Set the walkability of a single cell.
    ///
    /// Returns whether it changed.
    pub fn set_walkable_at(&mut self, p: Point, walkable: bool) -> Result<bool, GridError> {
        let changed = self.set_region_walkable(Range::with_size(p, Point::new(1, 1)), walkable)?;
        Ok(changed > 0)
    }

    /// [`region_is_clear`](Self::region_is_clear) anchored wherever `pointer`
    /// currently is.
    pub fn region_clear_under(&self, pointer: &impl PointerSource, size: Point) -> bool {
        self.region_is_clear(pointer.pointer_position(), size)
    }

    /// [`set_walkable`](Self::set_walkable) anchored wherever `pointer`
    /// currently is.
    pub fn set_walkable_under(
        &mut self,
        pointer: &impl PointerSource,
        size: Point,
        walkable: bool,
    ) -> Result<Range, GridError> {
        self.set_walkable(pointer.pointer_position(), size, walkable)
    }
}

impl Clone for NavGrid {
    fn clone(&self) -> Self {
        Self {
            id: next_grid_id(),
            config: self.config,
            width: self.width,
            height: self.height,
            nodes: self.nodes.clone(),
            revision: self.revision,
        }
    }
}

/// Map one world coordinate to a cell index along an axis of `cells` cells
/// starting at `min` and spanning `extent`.
#[inline]
fn axis_index(coord: f32, min: f32, extent: f32, cells: i32) -> i32 {
    let t = ((coord - min) / extent).clamp(0.0, 1.0);
    // NaN casts to 0
    let i = ((cells - 1) as f32 * t).round_ties_even() as i32;
    i.clamp(0, cells - 1)
}
