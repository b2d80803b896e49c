//! JSON-backed preference persistence.

use kindred_core::Result;
use kindred_core::preferences::{PreferenceRepository, Preferences};

use crate::json_store::JsonFileStore;

const PREFERENCES_KEY: &str = "preferences";

/// Stores [`Preferences`] under a single key, defaults when absent.
pub struct JsonPreferenceRepository {
    store: JsonFileStore,
}

impl JsonPreferenceRepository {
    pub fn new(store: JsonFileStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for JsonPreferenceRepository {
    async fn load(&self) -> Result<Preferences> {
        Ok(self.store.get(PREFERENCES_KEY).await?.unwrap_or_default())
    }

    async fn save(&self, preferences: &Preferences) -> Result<()> {
        self.store.put(PREFERENCES_KEY, preferences).await
    }
}
