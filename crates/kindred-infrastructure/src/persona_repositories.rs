//! JSON-backed persona persistence.
//!
//! Two collections, one key each: the override map for edited built-ins and
//! the list of user-created personas.

use std::collections::HashMap;

use kindred_core::Result;
use kindred_core::persona::{OverrideRepository, Persona, PersonaPatch, UserPersonaRepository};

use crate::json_store::JsonFileStore;

const OVERRIDES_KEY: &str = "persona_overrides";
const USER_PERSONAS_KEY: &str = "user_personas";

/// Stores the built-in override map under a single key.
pub struct JsonOverrideRepository {
    store: JsonFileStore,
}

impl JsonOverrideRepository {
    pub fn new(store: JsonFileStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl OverrideRepository for JsonOverrideRepository {
    async fn load(&self) -> Result<HashMap<String, PersonaPatch>> {
        Ok(self.store.get(OVERRIDES_KEY).await?.unwrap_or_default())
    }

    async fn save(&self, overrides: &HashMap<String, PersonaPatch>) -> Result<()> {
        self.store.put(OVERRIDES_KEY, overrides).await
    }
}

/// Stores the user persona list under a single key.
pub struct JsonUserPersonaRepository {
    store: JsonFileStore,
}

impl JsonUserPersonaRepository {
    pub fn new(store: JsonFileStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl UserPersonaRepository for JsonUserPersonaRepository {
    async fn load(&self) -> Result<Vec<Persona>> {
        Ok(self.store.get(USER_PERSONAS_KEY).await?.unwrap_or_default())
    }

    async fn save(&self, personas: &[Persona]) -> Result<()> {
        self.store.put(USER_PERSONAS_KEY, &personas.to_vec()).await
    }
}
