//! Persona persistence traits.
//!
//! Two collections back the registry: the id-keyed override map for edits to
//! built-in personas, and the ordered list of fully user-created personas.
//! Each is persisted whole under a single key, decoupling the registry from
//! the concrete storage mechanism.

use std::collections::HashMap;

use super::draft::PersonaPatch;
use super::model::Persona;
use crate::error::Result;

/// Persistence for the built-in persona override layer.
#[async_trait::async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Loads the persona-id -> patch map; empty when nothing was saved yet.
    async fn load(&self) -> Result<HashMap<String, PersonaPatch>>;

    /// Replaces the stored map.
    async fn save(&self, overrides: &HashMap<String, PersonaPatch>) -> Result<()>;
}

/// Persistence for the user-created persona list.
#[async_trait::async_trait]
pub trait UserPersonaRepository: Send + Sync {
    /// Loads all user personas in insertion order; empty when none exist.
    async fn load(&self) -> Result<Vec<Persona>>;

    /// Replaces the stored list.
    async fn save(&self, personas: &[Persona]) -> Result<()>;
}
