//! Board data structure
//!
//! The 2D grid of element tiles the player matches against.

use rand::seq::SliceRandom;
use rand::Rng;

use super::spawn::SpawnTable;
use super::tile::{ElementKind, Position, Tile};

/// Smallest board side
pub const MIN_SIDE: usize = 2;
/// Largest board side
pub const MAX_SIDE: usize = 7;
/// Default swap budget per turn
pub const DEFAULT_MAX_SWAPS: u32 = 3;

/// A connected group of same-element tiles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chain {
    pub element: Option<ElementKind>,
    pub tiles: Vec<Tile>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.tiles.iter().any(|t| t.position == pos)
    }
}

/// The match board
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    /// Row-major cells; `None` only between removal and refill
    cells: Vec<Option<ElementKind>>,
    swap_count: u32,
    max_swaps: u32,
}

impl Grid {
    /// Create a board filled by weighted spawn. Sides are clamped to 2..=7.
    pub fn new(width: usize, height: usize, table: &SpawnTable, rng: &mut impl Rng) -> Self {
        let mut grid = Self::empty(width, height);
        grid.fill_empty_tiles(table, rng);
        grid
    }

    /// Create a board with every cell empty
    fn empty(width: usize, height: usize) -> Self {
        let width = width.clamp(MIN_SIDE, MAX_SIDE);
        let height = height.clamp(MIN_SIDE, MAX_SIDE);
        Self {
            width,
            height,
            cells: vec![None; width * height],
            swap_count: 0,
            max_swaps: DEFAULT_MAX_SWAPS,
        }
    }

    /// Build a board from text rows (row index = y, column index = x).
    /// Returns `None` on ragged rows, unknown glyphs or sides outside 2..=7.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.chars().count();
        if !(MIN_SIDE..=MAX_SIDE).contains(&width) || !(MIN_SIDE..=MAX_SIDE).contains(&height) {
            return None;
        }

        let mut grid = Self::empty(width, height);
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return None;
            }
            for (x, c) in row.chars().enumerate() {
                let idx = grid.xy_to_idx(x, y);
                grid.cells[idx] = Some(ElementKind::from_glyph(c)?);
            }
        }
        Some(grid)
    }

    /// Replace the board with a freshly spawned one of the given size
    pub fn initialize(&mut self, width: usize, height: usize, table: &SpawnTable, rng: &mut impl Rng) {
        let max_swaps = self.max_swaps;
        *self = Self::new(width, height, table, rng);
        self.max_swaps = max_swaps;
    }

    /// Grow or shrink the board, respawning every cell
    pub fn resize(&mut self, width: usize, height: usize, table: &SpawnTable, rng: &mut impl Rng) {
        self.initialize(width, height, table, rng);
        log::info!("Board resized to {}x{}", self.width, self.height);
    }

    pub fn with_max_swaps(mut self, max_swaps: u32) -> Self {
        self.max_swaps = max_swaps;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Larger of the two sides
    pub fn board_max(&self) -> usize {
        self.width.max(self.height)
    }

    #[inline]
    fn xy_to_idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Element at a position, `None` when out of bounds or empty
    pub fn element_at(&self, pos: Position) -> Option<ElementKind> {
        if self.in_bounds(pos) {
            self.cells[self.xy_to_idx(pos.x, pos.y)]
        } else {
            None
        }
    }

    pub fn tile_at(&self, pos: Position) -> Option<Tile> {
        self.element_at(pos).map(|e| Tile::new(e, pos))
    }

    /// Overwrite one cell
    pub fn set_element(&mut self, pos: Position, element: ElementKind) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = self.xy_to_idx(pos.x, pos.y);
        self.cells[idx] = Some(element);
        true
    }

    /// True when no cell is empty
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// All occupied tiles in scan order (x-major, y-minor)
    pub fn tiles(&self) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(self.cells.len());
        for x in 0..self.width {
            for y in 0..self.height {
                if let Some(tile) = self.tile_at(Position::new(x, y)) {
                    tiles.push(tile);
                }
            }
        }
        tiles
    }

    /// Count of tiles per element kind
    pub fn element_counts(&self) -> Vec<(ElementKind, usize)> {
        ElementKind::ALL
            .iter()
            .map(|&e| (e, self.cells.iter().filter(|c| **c == Some(e)).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Size of the most common element on the board
    pub fn dominant_element_count(&self) -> usize {
        self.element_counts().into_iter().map(|(_, n)| n).max().unwrap_or(0)
    }

    // ========================================================================
    // Chain search
    // ========================================================================

    /// Longest 4-connected group of `element`.
    ///
    /// Components are discovered in scan order (x-major, y-minor) and only a
    /// strictly longer component replaces the current best, so ties keep the
    /// earliest one. Returns an empty chain if the element is absent.
    pub fn longest_chain(&self, element: ElementKind) -> Chain {
        let mut visited = vec![false; self.cells.len()];
        let mut best: Vec<Tile> = Vec::new();

        for x in 0..self.width {
            for y in 0..self.height {
                let idx = self.xy_to_idx(x, y);
                if visited[idx] || self.cells[idx] != Some(element) {
                    continue;
                }
                let component = self.flood_fill(Position::new(x, y), element, &mut visited);
                if component.len() > best.len() {
                    best = component;
                }
            }
        }

        Chain {
            element: if best.is_empty() { None } else { Some(element) },
            tiles: best,
        }
    }

    /// Iterative flood fill from `start`, marking `visited`
    fn flood_fill(&self, start: Position, element: ElementKind, visited: &mut [bool]) -> Vec<Tile> {
        let mut component = Vec::new();
        let mut stack = vec![start];

        while let Some(pos) = stack.pop() {
            if !self.in_bounds(pos) {
                continue;
            }
            let idx = self.xy_to_idx(pos.x, pos.y);
            if visited[idx] || self.cells[idx] != Some(element) {
                continue;
            }
            visited[idx] = true;
            component.push(Tile::new(element, pos));

            // Right, left, down, up
            stack.push(Position::new(pos.x + 1, pos.y));
            if pos.x > 0 {
                stack.push(Position::new(pos.x - 1, pos.y));
            }
            stack.push(Position::new(pos.x, pos.y + 1));
            if pos.y > 0 {
                stack.push(Position::new(pos.x, pos.y - 1));
            }
        }

        component
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Empty every cell of the chain. Returns how many cells were cleared.
    pub fn remove_tiles(&mut self, chain: &Chain) -> usize {
        let mut removed = 0;
        for tile in &chain.tiles {
            if !self.in_bounds(tile.position) {
                continue;
            }
            let idx = self.xy_to_idx(tile.position.x, tile.position.y);
            if self.cells[idx].take().is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Number of extra random removals for this board size
    pub fn additional_remove_count(&self) -> usize {
        self.board_max().saturating_sub(1)
    }

    /// Remove `max(width, height) - 1` random occupied tiles to force churn.
    /// Returns the cleared positions.
    pub fn apply_additional_random_remove(&mut self, rng: &mut impl Rng) -> Vec<Position> {
        let mut occupied: Vec<Position> = (0..self.cells.len())
            .filter(|&i| self.cells[i].is_some())
            .map(|i| Position::new(i % self.width, i / self.width))
            .collect();

        let count = self.additional_remove_count().min(occupied.len());
        let mut removed = Vec::with_capacity(count);
        for _ in 0..count {
            let pick = rng.gen_range(0..occupied.len());
            let pos = occupied.swap_remove(pick);
            let idx = self.xy_to_idx(pos.x, pos.y);
            self.cells[idx] = None;
            removed.push(pos);
        }
        removed
    }

    /// Spawn a tile into every empty cell. Returns how many were filled.
    pub fn fill_empty_tiles(&mut self, table: &SpawnTable, rng: &mut impl Rng) -> usize {
        let mut filled = 0;
        for x in 0..self.width {
            for y in 0..self.height {
                let idx = self.xy_to_idx(x, y);
                if self.cells[idx].is_none() {
                    self.cells[idx] = Some(table.roll(rng));
                    filled += 1;
                }
            }
        }
        filled
    }

    /// Randomly permute the elements on the board
    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cells.shuffle(rng);
    }

    // ========================================================================
    // Swapping
    // ========================================================================

    /// Exchange the elements of two cells.
    ///
    /// Rejected with no state change once the per-turn cap is reached, or
    /// when a position is out of bounds or both positions are the same.
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        if self.swap_count >= self.max_swaps {
            log::debug!("Swap rejected: cap of {} reached", self.max_swaps);
            return false;
        }
        if a == b || !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }

        let ia = self.xy_to_idx(a.x, a.y);
        let ib = self.xy_to_idx(b.x, b.y);
        self.cells.swap(ia, ib);
        self.swap_count += 1;
        log::debug!("Swapped ({},{}) <-> ({},{}) [{}/{}]", a.x, a.y, b.x, b.y, self.swap_count, self.max_swaps);
        true
    }

    pub fn remaining_swaps(&self) -> u32 {
        self.max_swaps.saturating_sub(self.swap_count)
    }

    pub fn reset_swaps(&mut self) {
        self.swap_count = 0;
    }

    /// Text rendering, one row per line, `.` for empty cells
    pub fn dump(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.cells[self.xy_to_idx(x, y)].map_or('.', |e| e.glyph()));
            }
            out.push('\n');
        }
        out
    }
}
