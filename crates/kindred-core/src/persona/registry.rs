//! Persona registry: layered lookup over presets, overrides and user personas.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::draft::{PersonaDraft, PersonaPatch};
use super::model::Persona;
use super::preset::default_presets;
use super::repository::{OverrideRepository, UserPersonaRepository};
use crate::error::{KindredError, Result};

/// Resolves the effective persona list.
///
/// Composition order is fixed: built-in templates with their overrides
/// applied, then user-created personas. Templates are never mutated; an edit
/// to a built-in persona is stored as a [`PersonaPatch`] in the override
/// layer, which keeps the original recoverable and the override
/// independently invalidatable.
///
/// Invariant: persona ids are unique across the merged registry. Preset ids
/// are fixed slugs, user personas get UUIDs at creation.
pub struct PersonaRegistry {
    presets: Vec<Persona>,
    overrides: RwLock<HashMap<String, PersonaPatch>>,
    user_added: RwLock<Vec<Persona>>,
    override_repo: Arc<dyn OverrideRepository>,
    user_repo: Arc<dyn UserPersonaRepository>,
}

impl PersonaRegistry {
    /// Creates a registry with both collections loaded from their repositories.
    pub async fn load(
        override_repo: Arc<dyn OverrideRepository>,
        user_repo: Arc<dyn UserPersonaRepository>,
    ) -> Result<Self> {
        let overrides = override_repo.load().await?;
        let user_added = user_repo.load().await?;
        Ok(Self {
            presets: default_presets(),
            overrides: RwLock::new(overrides),
            user_added: RwLock::new(user_added),
            override_repo,
            user_repo,
        })
    }

    /// Whether `id` names a built-in template.
    pub fn is_builtin(&self, id: &str) -> bool {
        self.presets.iter().any(|p| p.id == id)
    }

    /// The effective persona list: overridden presets, then user personas.
    pub async fn list(&self) -> Vec<Persona> {
        let overrides = self.overrides.read().await;
        let user_added = self.user_added.read().await;

        let mut merged: Vec<Persona> = self
            .presets
            .iter()
            .map(|p| match overrides.get(&p.id) {
                Some(patch) => patch.apply(p),
                None => p.clone(),
            })
            .collect();
        merged.extend(user_added.iter().cloned());
        merged
    }

    /// The effective persona for `id`.
    pub async fn get(&self, id: &str) -> Result<Persona> {
        if let Some(preset) = self.presets.iter().find(|p| p.id == id) {
            let overrides = self.overrides.read().await;
            return Ok(match overrides.get(id) {
                Some(patch) => patch.apply(preset),
                None => preset.clone(),
            });
        }

        let user_added = self.user_added.read().await;
        user_added
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| KindredError::not_found("persona", id))
    }

    /// Creates a user persona from `draft` and persists the user collection.
    pub async fn create(&self, draft: PersonaDraft) -> Result<Persona> {
        draft.validate()?;
        let persona = draft.into_persona();

        let mut user_added = self.user_added.write().await;
        user_added.push(persona.clone());
        self.user_repo.save(&user_added).await?;
        Ok(persona)
    }

    /// Applies `patch` to the persona with `id`.
    ///
    /// For built-ins the patch replaces the stored override (the template is
    /// retained); for user personas the fields are folded in place. Returns
    /// the effective persona after the edit.
    pub async fn update(&self, id: &str, patch: PersonaPatch) -> Result<Persona> {
        if let Some(preset) = self.presets.iter().find(|p| p.id == id) {
            let mut overrides = self.overrides.write().await;
            overrides.insert(id.to_string(), patch.clone());
            self.override_repo.save(&overrides).await?;
            return Ok(patch.apply(preset));
        }

        let mut user_added = self.user_added.write().await;
        let Some(existing) = user_added.iter_mut().find(|p| p.id == id) else {
            return Err(KindredError::not_found("persona", id));
        };

        let mut merged = patch.apply(existing);
        // A user persona carries edits directly; it never becomes "customized".
        merged.is_customized = false;
        merged.is_user_added = true;
        *existing = merged.clone();
        self.user_repo.save(&user_added).await?;
        Ok(merged)
    }

    /// Removes a user persona and persists the user collection.
    ///
    /// Built-in personas cannot be deleted. Callers owning sessions and
    /// transcripts must drop those for `id` as well.
    pub async fn remove(&self, id: &str) -> Result<()> {
        if self.is_builtin(id) {
            return Err(KindredError::forbidden(format!(
                "built-in persona '{id}' cannot be deleted"
            )));
        }

        let mut user_added = self.user_added.write().await;
        let before = user_added.len();
        user_added.retain(|p| p.id != id);
        if user_added.len() == before {
            return Err(KindredError::not_found("persona", id));
        }
        self.user_repo.save(&user_added).await?;
        Ok(())
    }
}
