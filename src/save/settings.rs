//! Persistent settings flags
//!
//! The only state that outlives a session is a handful of boolean flags,
//! the endless-mode unlock among them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Flag set once a normal run reaches the unlock stage
pub const ENDLESS_UNLOCK_KEY: &str = "EndlessModeUnlocked";

/// Errors raised by file-backed stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Key/value boolean storage
pub trait SettingsStore {
    /// Value for `key`, `false` when unset
    fn get_bool(&self, key: &str) -> bool;

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError>;
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    flags: BTreeMap<String, bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_bool(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.flags.insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// File Storage
// ============================================================================

/// JSON file store. Every write is flushed to disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    flags: BTreeMap<String, bool>,
}

impl JsonFileStore {
    /// Open the store at the platform data directory
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(settings_path())
    }

    /// Open a store at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let flags = if path.exists() {
            let data = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let flags = serde_json::from_str(&data)?;
            log::info!("Settings loaded from {:?}", path);
            flags
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, flags })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.flags)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Settings saved to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StoreError> {
        self.flags.insert(key.to_string(), value);
        self.flush()
    }
}

/// Get the settings file path
pub fn settings_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "manachain", "Manachain") {
        let mut path = proj_dirs.data_local_dir().to_path_buf();
        path.push("settings.json");
        path
    } else {
        PathBuf::from("./settings.json")
    }
}
