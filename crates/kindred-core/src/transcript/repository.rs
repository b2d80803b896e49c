//! Transcript persistence trait.

use super::message::Message;
use crate::error::Result;

/// Persistence for per-persona message logs.
///
/// One ordered log per persona id, written whole on every mutation.
/// Last-write-wins; there is exactly one local writer.
#[async_trait::async_trait]
pub trait TranscriptRepository: Send + Sync {
    /// Loads the persisted log for a persona, `None` when nothing was saved.
    async fn load(&self, persona_id: &str) -> Result<Option<Vec<Message>>>;

    /// Replaces the persisted log for a persona.
    async fn save(&self, persona_id: &str, messages: &[Message]) -> Result<()>;

    /// Removes the persisted log for a persona; absent logs are not an error.
    async fn delete(&self, persona_id: &str) -> Result<()>;
}
