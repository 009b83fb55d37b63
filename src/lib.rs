//! Manachain - rules engine for an elemental chain-matching combat game
//!
//! Match the longest chain of an element to strike the enemy, build combos,
//! buy items between stages and climb as far as you can.

pub mod board;
pub mod combat;
pub mod data;
pub mod game;
pub mod items;
pub mod progression;
pub mod save;

// Re-export commonly used types
pub use board::{Chain, ElementKind, Grid, Position};
pub use data::DataManager;
pub use game::{GameConfig, PlayerAction, Session, TurnPhase, TurnResult};
pub use progression::{GameMode, Grade};
