//! Item system

pub mod item;
pub mod registry;
pub mod resonance;
pub mod shop;

pub use item::{Consumable, ItemDef, ItemEffect, ItemKind};
pub use registry::ItemRegistry;
pub use resonance::{Resonance, ResonanceSet};
pub use shop::Shop;
