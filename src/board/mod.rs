//! Board module
//!
//! Element tiles, the match grid and weighted spawning.

pub mod grid;
pub mod spawn;
pub mod tile;

pub use grid::{Chain, Grid, DEFAULT_MAX_SWAPS, MAX_SIDE, MIN_SIDE};
pub use spawn::SpawnTable;
pub use tile::{ElementKind, Position, Tile};
