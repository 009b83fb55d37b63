//! RON data loader
//!
//! Loads rule tunables, enemies and the item catalog from external RON
//! files, with fallback to hardcoded defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::catalog::{default_item_catalog, ItemCatalog};
use super::enemies::{default_enemy_templates, EnemyTemplates};
use crate::game::GameConfig;

/// Default data directory, relative to the working directory
pub const DATA_DIR: &str = "assets/data";

/// Errors raised while exporting data files
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {0}: {1}")]
    Serialize(&'static str, #[source] ron::Error),
}

/// Manages all external game data
#[derive(Debug, Clone)]
pub struct DataManager {
    /// Rule tunables
    pub config: GameConfig,
    /// Enemy templates
    pub enemies: EnemyTemplates,
    /// Shop catalog
    pub items: ItemCatalog,
}

impl DataManager {
    /// Create a new DataManager, loading from `assets/data` or using defaults
    pub fn new() -> Self {
        Self::load_from(Path::new(DATA_DIR))
    }

    /// Load every data file from a directory. Missing or broken files fall
    /// back to their defaults individually.
    pub fn load_from(base_path: &Path) -> Self {
        let config = load_or_default(base_path, "config.ron", GameConfig::default);
        let enemies = load_or_default(base_path, "enemies.ron", default_enemy_templates);
        let items = load_or_default(base_path, "items.ron", default_item_catalog);

        log::debug!(
            "Data loaded: {} enemy templates, {} items",
            enemies.templates.len(),
            items.items.len()
        );

        Self { config, enemies, items }
    }

    /// Get enemy templates
    pub fn enemy_templates(&self) -> &EnemyTemplates {
        &self.enemies
    }

    /// Get the item catalog
    pub fn item_catalog(&self) -> &ItemCatalog {
        &self.items
    }
}

impl Default for DataManager {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            enemies: default_enemy_templates(),
            items: default_item_catalog(),
        }
    }
}

fn load_or_default<T: DeserializeOwned>(base_path: &Path, file: &str, fallback: fn() -> T) -> T {
    let path = base_path.join(file);
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(value) => {
                    log::info!("Loaded {}", path.display());
                    return value;
                }
                Err(e) => log::warn!("Failed to parse {}: {}", file, e),
            },
            Err(e) => log::warn!("Failed to read {}: {}", file, e),
        }
    }
    fallback()
}

fn write_ron<T: Serialize>(base_path: &Path, file: &'static str, value: &T) -> Result<(), DataError> {
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| DataError::Serialize(file, e))?;
    let path = base_path.join(file);
    fs::write(&path, text).map_err(|source| DataError::Io { path, source })
}

/// Export all default data to RON files for easy editing
pub fn export_default_data(base_path: &Path) -> Result<(), DataError> {
    fs::create_dir_all(base_path).map_err(|source| DataError::Io {
        path: base_path.to_path_buf(),
        source,
    })?;

    write_ron(base_path, "config.ron", &GameConfig::default())?;
    write_ron(base_path, "enemies.ron", &default_enemy_templates())?;
    write_ron(base_path, "items.ron", &default_item_catalog())?;

    log::info!("Default data exported to {}", base_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("manachain-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_export_and_load() {
        let dir = scratch_dir("export");
        let result = export_default_data(&dir);
        assert!(result.is_ok(), "Failed to export default data: {:?}", result.err());

        assert!(dir.join("config.ron").exists(), "config.ron not created");
        assert!(dir.join("enemies.ron").exists(), "enemies.ron not created");
        assert!(dir.join("items.ron").exists(), "items.ron not created");

        let manager = DataManager::load_from(&dir);
        assert_eq!(manager.enemies, default_enemy_templates());
        assert_eq!(manager.items, default_item_catalog());
        assert_eq!(manager.config, GameConfig::default());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_dir_uses_defaults() {
        let manager = DataManager::load_from(&scratch_dir("missing"));
        assert!(!manager.enemies.templates.is_empty());
        assert!(!manager.items.items.is_empty());
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = scratch_dir("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("enemies.ron"), "(templates: [oops").unwrap();
        fs::write(dir.join("config.ron"), "(max_swaps: 5)").unwrap();

        let manager = DataManager::load_from(&dir);
        assert_eq!(manager.enemies, default_enemy_templates());
        assert_eq!(manager.config.max_swaps, 5);

        let _ = fs::remove_dir_all(&dir);
    }
}
