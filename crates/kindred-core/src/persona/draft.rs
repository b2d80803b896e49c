//! Persona creation and override request models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Gender, Persona, placeholder_avatar};
use crate::error::{KindredError, Result};

/// Request to create a new user persona.
///
/// Converted into a [`Persona`] with a freshly generated UUID; the voice and
/// avatar fall back to gender-derived defaults when the caller leaves them
/// unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDraft {
    pub name: String,
    pub role: String,
    pub gender: Gender,
    pub description: String,
    pub system_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl PersonaDraft {
    /// Validate the request and return errors if any.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(KindredError::invalid("Name is required and cannot be empty"));
        }
        if self.role.trim().is_empty() {
            return Err(KindredError::invalid("Role is required and cannot be empty"));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(KindredError::invalid(
                "Behaviour instructions are required and cannot be empty",
            ));
        }
        Ok(())
    }

    /// Convert this draft into a Persona, always generating a new UUID.
    pub fn into_persona(self) -> Persona {
        let id = Uuid::new_v4().to_string();
        let voice = self
            .voice
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.gender.default_voice().to_string());
        let avatar = self
            .avatar
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| placeholder_avatar(&self.name, self.gender));

        Persona {
            id,
            name: self.name,
            role: self.role,
            gender: self.gender,
            avatar,
            description: self.description,
            system_prompt: self.system_prompt,
            color: self.color.unwrap_or_else(|| "bg-indigo-500".to_string()),
            voice,
            is_customized: false,
            is_user_added: true,
        }
    }
}

/// A user-supplied patch layered on top of a persona.
///
/// For built-in personas the patch is stored in the override layer and the
/// template is retained untouched; for user-added personas it is folded into
/// the persona itself. Only present fields override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl PersonaPatch {
    /// Applies this patch on top of `base`, marking the result as customized.
    ///
    /// `base` is left untouched; built-in templates stay immutable.
    pub fn apply(&self, base: &Persona) -> Persona {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(role) = &self.role {
            merged.role = role.clone();
        }
        if let Some(gender) = self.gender {
            merged.gender = gender;
        }
        if let Some(avatar) = &self.avatar {
            merged.avatar = avatar.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(system_prompt) = &self.system_prompt {
            merged.system_prompt = system_prompt.clone();
        }
        if let Some(color) = &self.color {
            merged.color = color.clone();
        }
        if let Some(voice) = &self.voice {
            merged.voice = voice.clone();
        }
        merged.is_customized = true;
        merged
    }
}
