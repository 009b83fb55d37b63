//! Data loading and external game content
//!
//! This module handles loading rule tunables, enemies and the shop catalog
//! from external RON files, allowing for data-driven balancing.

pub mod catalog;
pub mod enemies;
pub mod loader;

pub use catalog::{default_item_catalog, ItemCatalog};
pub use enemies::{default_enemy_templates, EnemyTemplate, EnemyTemplates};
pub use loader::{export_default_data, DataError, DataManager};
