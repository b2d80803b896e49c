//! Kindred infrastructure: flat JSON persistence and path resolution.

pub mod json_store;
pub mod paths;
pub mod persona_repositories;
pub mod preference_repository;
pub mod transcript_repository;

pub use json_store::JsonFileStore;
pub use paths::{KindredPaths, PathError};
pub use persona_repositories::{JsonOverrideRepository, JsonUserPersonaRepository};
pub use preference_repository::JsonPreferenceRepository;
pub use transcript_repository::JsonTranscriptRepository;
