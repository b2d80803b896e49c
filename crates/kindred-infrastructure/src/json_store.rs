//! Flat JSON key-value store.
//!
//! One key = one `<key>.json` file under the base directory, written whole on
//! every put. This keeps each persisted collection independently readable and
//! invalidatable; last write wins, which is sufficient for the single local
//! writer this store serves.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::debug;

use kindred_core::{KindredError, Result};

/// JSON file-per-key store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store over `base_dir`. The directory is created lazily on
    /// the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize_key(key)))
    }

    async fn ensure_base_dir(&self) -> Result<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).await?;
        }
        Ok(())
    }

    /// Reads and deserializes the value stored under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.key_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = serde_json::from_str(&content)?;
        Ok(Some(value))
    }

    /// Serializes `value` and replaces whatever is stored under `key`.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_base_dir().await?;
        let path = self.key_path(key);
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content).await?;
        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    /// Removes the value stored under `key`; a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "removed value");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KindredError::from(e)),
        }
    }
}

/// Keeps keys safe as file names. Persona ids are slugs or UUIDs, so this
/// only ever rewrites hostile input.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
