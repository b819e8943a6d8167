//! Local key/value storage
//!
//! Small JSON documents kept on the device, isolated per namespace:
//! the signed-in auth session and user preferences.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const SESSION_NAMESPACE: &str = "auth";
pub const PREFERENCES_NAMESPACE: &str = "preferences";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored value: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<local data dir>/omnibot`, or `./cache` when the platform has none.
    pub fn default_location() -> Self {
        match dirs::data_local_dir() {
            Some(data_dir) => Self::new(data_dir.join("omnibot")),
            None => Self::new(PathBuf::from("cache")),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(sanitize_segment(namespace, usize::MAX))
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.json", sanitize_segment(key, 64)))
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(namespace, key)).ok()
    }

    pub fn set(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(self.namespace_dir(namespace))?;
        fs::write(self.entry_path(namespace, key), value)?;
        Ok(())
    }

    pub fn delete(&self, namespace: &str, key: &str) -> StorageResult<()> {
        let path = self.entry_path(namespace, key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Missing entries read as `Ok(None)`; unreadable JSON is an error.
    pub fn get_json<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> StorageResult<Option<T>> {
        match self.get(namespace, key) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(namespace, key, &raw)
    }
}

/// Keeps `[A-Za-z0-9_-]`, replaces everything else with `_`.
fn sanitize_segment(raw: &str, max_len: usize) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect()
}
