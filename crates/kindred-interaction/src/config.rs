//! Provider credential loading.
//!
//! Priority: `~/.config/kindred/secret.json` > environment variables.
//! A missing key is fatal at client construction; nothing else proceeds
//! without the chat capability.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use kindred_infrastructure::KindredPaths;

/// Root structure of secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiCredentials>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiCredentials {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

fn secret_path() -> PathBuf {
    KindredPaths::secret_file()
        .unwrap_or_else(|_| PathBuf::from("~/.config/kindred/secret.json"))
}

/// Loads secret.json when present.
pub fn load_secret_config() -> Result<Option<SecretConfig>, ConfigError> {
    let path = secret_path();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let config = serde_json::from_str(&content).map_err(|e| ConfigError::Invalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(config))
}

/// Resolves the Gemini credentials from secret.json or the environment.
pub fn resolve_credentials() -> Result<GeminiCredentials, ConfigError> {
    if let Some(config) = load_secret_config()? {
        if let Some(gemini) = config.gemini {
            if !gemini.api_key.trim().is_empty() {
                return Ok(gemini);
            }
        }
    }

    match env::var("GEMINI_API_KEY") {
        Ok(api_key) if !api_key.trim().is_empty() => Ok(GeminiCredentials {
            api_key,
            model_name: env::var("GEMINI_MODEL_NAME").ok(),
        }),
        _ => Err(ConfigError::MissingApiKey {
            path: secret_path().display().to_string(),
        }),
    }
}
