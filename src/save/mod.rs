//! Persistence
//!
//! Only the unlock flags survive between runs.

pub mod settings;

pub use settings::{settings_path, JsonFileStore, MemoryStore, SettingsStore, StoreError, ENDLESS_UNLOCK_KEY};
