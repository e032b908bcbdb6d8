//! Durable local key/value store
//!
//! Holds the few values that must survive a restart (the verified phone
//! number and the signed-in email). Values are plain strings under fixed keys.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// Key holding the verified phone number
pub const PHONE_KEY: &str = "verified_phone";

/// Key holding the signed-in email
pub const EMAIL_KEY: &str = "signed_in_email";

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every update is a single insert or remove, so a poisoned map is still whole
    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(values) => values.get(key).cloned(),
            Err(e) => {
                log::warn!("Failed to read local store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}
