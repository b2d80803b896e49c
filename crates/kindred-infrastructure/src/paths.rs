//! Unified path management for Kindred configuration and state files.
//!
//! Everything lives under the platform config directory so a single
//! directory holds the whole local footprint.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/kindred/           # Config directory
//! ├── secret.json              # Provider API key
//! └── state/                   # Persisted key-value state (JsonFileStore)
//!     ├── persona_overrides.json
//!     ├── user_personas.json
//!     ├── preferences.json
//!     └── history_<persona-id>.json
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Kindred.
pub struct KindredPaths;

impl KindredPaths {
    /// Returns the Kindred configuration directory (e.g. `~/.config/kindred/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("kindred"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Returns the directory backing the persisted key-value state.
    pub fn state_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("state"))
    }
}
