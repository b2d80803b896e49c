//! User preferences and their persistence trait.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted user preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Speak every completed reply aloud with the persona's voice.
    #[serde(default)]
    pub auto_speak: bool,
}

/// Persistence for [`Preferences`]; defaults apply when nothing was saved.
#[async_trait::async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn load(&self) -> Result<Preferences>;
    async fn save(&self, preferences: &Preferences) -> Result<()>;
}
