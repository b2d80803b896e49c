//! Persona domain model.
//!
//! A persona is one configured chat character: its identity, relationship
//! role, behaviour instructions and presentation hints (avatar, accent color,
//! synthesis voice).

use serde::{Deserialize, Serialize};

/// Gender tag of a persona, used to pick a default synthesis voice and the
/// generated placeholder avatar palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// The default prebuilt voice for this gender.
    pub fn default_voice(&self) -> &'static str {
        match self {
            Gender::Male => "Zephyr",
            Gender::Female => "Aoede",
        }
    }

    /// The lowercase tag used in prompts and serialized forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// One prebuilt synthesis voice, for editor UIs to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    /// Provider voice identifier (e.g. "Zephyr").
    pub name: &'static str,
    pub gender: Gender,
    /// Short tone description shown next to the name.
    pub tone: &'static str,
}

/// All prebuilt voices the synthesis capability supports.
pub const PREBUILT_VOICES: &[Voice] = &[
    Voice { name: "Zephyr", gender: Gender::Male, tone: "Deep & Warm" },
    Voice { name: "Fenrir", gender: Gender::Male, tone: "Sturdy & Deep" },
    Voice { name: "Puck", gender: Gender::Male, tone: "Energetic" },
    Voice { name: "Charon", gender: Gender::Male, tone: "Casual" },
    Voice { name: "Aoede", gender: Gender::Female, tone: "Wise & Warm" },
    Voice { name: "Kore", gender: Gender::Female, tone: "Bright" },
];

/// A persona representing one chat character.
///
/// Built-in personas are immutable templates; user edits to them are stored
/// separately as [`PersonaPatch`](super::PersonaPatch) overrides and applied
/// at read time. User-created personas are independent entities with a
/// generated UUID identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Stable unique identifier (preset slug or UUID)
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Relationship role label (e.g. "Husband", "Sister")
    pub role: String,
    pub gender: Gender,
    /// Avatar reference: a URL or an inline `data:` image
    pub avatar: String,
    /// Short description shown on the character card
    pub description: String,
    /// Behaviour instructions baked into the provider session
    pub system_prompt: String,
    /// Accent color tag for the UI
    pub color: String,
    /// Prebuilt synthesis voice name
    pub voice: String,
    /// Built-in persona with user edits applied
    #[serde(default)]
    pub is_customized: bool,
    /// Fully user-created persona
    #[serde(default)]
    pub is_user_added: bool,
}

/// Deterministic placeholder avatar for personas without one.
///
/// Initials-based image, tinted by gender to match the editor's preview.
pub fn placeholder_avatar(name: &str, gender: Gender) -> String {
    let background = match gender {
        Gender::Male => "6366f1",
        Gender::Female => "f43f5e",
    };
    let name_param = name.trim().replace(' ', "+");
    format!(
        "https://ui-avatars.com/api/?name={name_param}&background={background}&color=fff&size=512&bold=true"
    )
}
