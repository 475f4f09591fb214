//! Logical hex grid rebuilt from map snapshots

use tracing::{debug, info, info_span, warn, Span};

use crate::hex::{HecsCoord, HexBoundary, HexCell, HexDirection};

use super::source::{MapSource, TileInfo};

/// Largest grid a map snapshot may ask for
pub const MAX_CELLS: usize = 1 << 20;

/// Opaque handle to a renderer-owned tile object
pub type RenderHandle = u64;

/// Instantiates and destroys the visual side of tiles
pub trait TileRenderer {
    fn instantiate(&mut self, tile: &TileInfo) -> Option<RenderHandle>;
    fn destroy(&mut self, handle: RenderHandle);
}

/// Renderer that only hands out handles
#[derive(Debug, Default)]
pub struct NullRenderer {
    next_handle: RenderHandle,
}

impl TileRenderer for NullRenderer {
    fn instantiate(&mut self, _tile: &TileInfo) -> Option<RenderHandle> {
        self.next_handle += 1;
        Some(self.next_handle)
    }

    fn destroy(&mut self, _handle: RenderHandle) {}
}

/// Grid lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    Uninitialized,
    /// Allocated, every cell empty
    Initialized,
    /// Tiles placed and edges reconciled
    Populated,
}

/// Cells indexed by `(a, r, c)`, backed by one flat vector.
pub struct GridManager<M: MapSource> {
    source: M,
    renderer: Box<dyn TileRenderer>,
    state: GridState,
    /// Offset rows on the map
    rows: i32,
    /// Rows per parity array
    r_dim: i32,
    c_dim: i32,
    cells: Vec<HexCell>,
    populated: Vec<bool>,
    handles: Vec<RenderHandle>,
    span: Span,
}

impl<M: MapSource> GridManager<M> {
    pub fn new(source: M, renderer: Box<dyn TileRenderer>) -> Self {
        Self::with_span(source, renderer, info_span!("grid"))
    }

    pub fn with_span(source: M, renderer: Box<dyn TileRenderer>, span: Span) -> Self {
        Self {
            source,
            renderer,
            state: GridState::Uninitialized,
            rows: 0,
            r_dim: 0,
            c_dim: 0,
            cells: Vec::new(),
            populated: Vec::new(),
            handles: Vec::new(),
            span,
        }
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    /// `(rows, r_dim, cols, cell count)` for a map, or None past [`MAX_CELLS`].
    fn layout(rows: i32, cols: i32) -> Option<(i32, i32, i32, usize)> {
        let (rows, cols) = (rows.max(0), cols.max(0));
        if rows == 0 || cols == 0 {
            return Some((0, 0, 0, 0));
        }
        let r_dim = rows / 2 + rows % 2;
        let len = (r_dim as usize)
            .checked_mul(2)?
            .checked_mul(cols as usize)?;
        (len <= MAX_CELLS).then_some((rows, r_dim, cols, len))
    }

    /// Allocate a fresh grid from the source's dimensions, all cells empty.
    /// Returns false, leaving the grid untouched, when the map is too large.
    pub fn initialize_grid(&mut self) -> bool {
        let (rows, cols) = self.source.map_dimensions();
        let Some((rows, r_dim, c_dim, len)) = Self::layout(rows, cols) else {
            warn!(parent: &self.span, rows, cols, max_cells = MAX_CELLS, "Map too large");
            return false;
        };
        self.rows = rows;
        self.r_dim = r_dim;
        self.c_dim = c_dim;

        // With an odd row count the last parity-1 row is allocated but off the map.
        self.cells = Vec::with_capacity(len);
        for a in 0..2 {
            for r in 0..self.r_dim {
                for c in 0..self.c_dim {
                    self.cells.push(HexCell::empty(HecsCoord::new(a, r, c)));
                }
            }
        }
        self.populated = vec![false; len];
        self.state = GridState::Initialized;

        debug!(parent: &self.span, rows, cols, "Grid initialized");
        true
    }

    /// Poll the source and rebuild when a new snapshot is ready.
    /// Returns true when a map was loaded this tick.
    pub fn tick(&mut self) -> bool {
        if !self.source.is_map_ready() {
            return false;
        }

        let (rows, cols) = self.source.map_dimensions();
        if Self::layout(rows, cols).is_none() {
            warn!(parent: &self.span, rows, cols, "Map snapshot rejected, keeping current grid");
            self.source.fetch_tile_list();
            return false;
        }

        for handle in self.handles.drain(..) {
            self.renderer.destroy(handle);
        }
        if !self.initialize_grid() {
            self.source.fetch_tile_list();
            return false;
        }

        let tiles = self.source.fetch_tile_list();
        let mut placed = 0usize;
        for tile in &tiles {
            let Some(index) = self.index(tile.cell.coord) else {
                warn!(parent: &self.span, coord = %tile.cell.coord, "Tile outside map bounds, skipping");
                continue;
            };
            self.cells[index] = tile.cell;
            self.populated[index] = true;
            if let Some(handle) = self.renderer.instantiate(tile) {
                self.handles.push(handle);
            }
            placed += 1;
        }

        self.propagate_edges();
        self.derive_layer_edges();
        self.state = GridState::Populated;

        info!(parent: &self.span, tiles = placed, "Map loaded");
        true
    }

    /// A set bit on either side of a shared edge is copied to the other side.
    /// Bits are only ever added.
    fn propagate_edges(&mut self) {
        for i in 0..self.cells.len() {
            let cell = self.cells[i];
            for direction in HexDirection::ALL {
                if !cell.boundary.get_edge(direction) {
                    continue;
                }
                if let Some(j) = self.index(cell.coord.neighbor(direction)) {
                    self.cells[j].boundary.set_edge(direction.opposite());
                }
            }
        }
    }

    /// Neighboring tiles more than one layer apart are walled off.
    fn derive_layer_edges(&mut self) {
        for i in 0..self.cells.len() {
            if !self.populated[i] {
                continue;
            }
            let cell = self.cells[i];
            for direction in HexDirection::ALL {
                let Some(j) = self.index(cell.coord.neighbor(direction)) else {
                    continue;
                };
                if self.populated[j] && cell.is_cliff_to(&self.cells[j]) {
                    self.cells[i].boundary.set_edge(direction);
                    self.cells[j].boundary.set_edge(direction.opposite());
                }
            }
        }
    }

    /// Slot of `coord` if it lies on the map: offset row in `0..rows`,
    /// column in `0..cols`.
    fn index(&self, coord: HecsCoord) -> Option<usize> {
        if !(0..2).contains(&coord.a) || !(0..self.c_dim).contains(&coord.c) {
            return None;
        }
        let parity_span = self.rows - coord.a;
        let parity_rows = parity_span / 2 + parity_span % 2;
        if !(0..parity_rows).contains(&coord.r) {
            return None;
        }
        let slot = (coord.a as usize * self.r_dim as usize + coord.r as usize)
            * self.c_dim as usize
            + coord.c as usize;
        Some(slot)
    }

    pub fn contains(&self, coord: HecsCoord) -> bool {
        self.index(coord).is_some()
    }

    pub fn cell(&self, coord: HecsCoord) -> Option<&HexCell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    /// Boundary at `coord`, empty when out of bounds
    pub fn boundary(&self, coord: HecsCoord) -> HexBoundary {
        self.cell(coord).map(|c| c.boundary).unwrap_or_default()
    }

    /// Height at `coord`, zero when out of bounds
    pub fn height(&self, coord: HecsCoord) -> f32 {
        self.cell(coord).map(|c| c.height).unwrap_or(0.0)
    }

    /// Whether a blocking edge separates two adjacent coordinates
    pub fn edge_between(&self, a: HecsCoord, b: HecsCoord) -> bool {
        self.boundary(a).get_edge_with(a, b)
    }

    /// A tile was placed at `coord` by the last map
    pub fn is_populated(&self, coord: HecsCoord) -> bool {
        self.index(coord).is_some_and(|i| self.populated[i])
    }

    /// Whether a single step from `from` to `to` is allowed. Both ends must
    /// be tiles on the map.
    pub fn is_passable(&self, from: HecsCoord, to: HecsCoord) -> bool {
        from.is_adjacent_to(to)
            && self.is_populated(from)
            && self.is_populated(to)
            && !self.edge_between(from, to)
    }
}
