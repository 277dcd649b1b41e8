//! Durable key-value settings
//!
//! Holds the values a user expects to survive between runs: the chosen
//! endpoint and the last account entered for each asset.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{YieldError, YieldResult};

/// Key of the persisted endpoint URL
pub const PROVIDER_URL_KEY: &str = "providerUrl";

/// Key of the last account used for an asset
pub fn account_key(symbol: &str) -> String {
    format!("userAddress.{}", symbol.to_uppercase())
}

/// Process-wide string settings
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`, or `default` when absent
    fn get(&self, key: &str, default: &str) -> String;

    /// Store `value` under `key`
    fn set(&self, key: &str, value: &str) -> YieldResult<()>;
}

/// Settings kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str, default: &str) -> String {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> YieldResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Settings persisted as a flat TOML table, rewritten on every `set`
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSettingsStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> YieldResult<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                YieldError::Settings(format!("Failed to read {}: {}", path.display(), e))
            })?;
            toml::from_str(&content).map_err(|e| {
                YieldError::Settings(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings store {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, String>) -> YieldResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    YieldError::Settings(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let content = toml::to_string(values)
            .map_err(|e| YieldError::Settings(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&self.path, content).map_err(|e| {
            YieldError::Settings(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str, default: &str) -> String {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> YieldResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_defaults() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get("missing", "fallback"), "fallback");

        store.set("missing", "present").unwrap();
        assert_eq!(store.get("missing", "fallback"), "present");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let store = FileSettingsStore::open(&path).unwrap();
        store.set(PROVIDER_URL_KEY, "http://localhost:8545").unwrap();
        store.set(&account_key("usdc"), "0xabc").unwrap();
        drop(store);

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get(PROVIDER_URL_KEY, ""), "http://localhost:8545");
        assert_eq!(reopened.get("userAddress.USDC", ""), "0xabc");
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "not = [valid").unwrap();

        assert!(matches!(
            FileSettingsStore::open(&path),
            Err(YieldError::Settings(_))
        ));
    }
}
