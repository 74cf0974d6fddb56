// src/store.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::data_types::{Settings, WatchlistEntry};
use crate::error::StoreError;

const SETTINGS_KEY: &str = "sheetbase_settings";
const WATCHLIST_KEY: &str = "sheetbase_watchlist";

/// Durable storage for settings and the watchlist, one JSON file per key.
///
/// Loads never fail: a missing file means defaults, and a broken file is
/// logged and treated the same way.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Store { dir: dir.into() }
    }

    /// `<config_dir>/sheetbase`, or `./sheetbase` when the platform has no config dir.
    pub fn open_default() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetbase");
        Store::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_settings(&self) -> Settings {
        self.load(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.save(SETTINGS_KEY, settings)
    }

    pub fn load_watchlist(&self) -> Vec<WatchlistEntry> {
        self.load(WATCHLIST_KEY).unwrap_or_default()
    }

    pub fn save_watchlist(&self, watchlist: &[WatchlistEntry]) -> Result<(), StoreError> {
        self.save(WATCHLIST_KEY, watchlist)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Error parsing {}: {}; using defaults", path.display(), e);
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }
}
