//! Persona domain module.
//!
//! - `model`: the [`Persona`] entity, gender and voice catalog
//! - `preset`: built-in persona templates
//! - `draft`: creation drafts and override patches
//! - `repository`: persistence traits for the two persona collections
//! - `registry`: the layered merge and CRUD over all of it

mod draft;
mod model;
mod preset;
mod registry;
mod repository;

pub use draft::{PersonaDraft, PersonaPatch};
pub use model::{Gender, PREBUILT_VOICES, Persona, Voice, placeholder_avatar};
pub use preset::default_presets;
pub use registry::PersonaRegistry;
pub use repository::{OverrideRepository, UserPersonaRepository};
