//! Transcript store: per-persona ordered message logs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::message::{Message, MessagePatch};
use super::repository::TranscriptRepository;
use crate::error::{KindredError, Result};

/// Keeps each persona's transcript in memory and flushes the full log to the
/// repository after every mutation.
///
/// Transcripts are strictly append-only; the only in-place edits are the
/// streaming model message's content and a user message's delivery status,
/// both routed through [`MessagePatch`].
pub struct TranscriptStore {
    histories: RwLock<HashMap<String, Vec<Message>>>,
    repository: Arc<dyn TranscriptRepository>,
}

impl TranscriptStore {
    pub fn new(repository: Arc<dyn TranscriptRepository>) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            repository,
        }
    }

    /// Opens a persona's transcript, seeding a greeting when none exists.
    ///
    /// The seed is persisted immediately, so opening the same persona again
    /// returns the stored single message unchanged.
    pub async fn open(&self, persona_id: &str, persona_name: &str) -> Result<Vec<Message>> {
        if let Some(messages) = self.load(persona_id).await? {
            return Ok(messages);
        }

        let seeded = vec![Message::greeting(persona_name)];
        self.save(persona_id, seeded.clone()).await?;
        Ok(seeded)
    }

    /// The persisted log for a persona, without seeding.
    pub async fn load(&self, persona_id: &str) -> Result<Option<Vec<Message>>> {
        {
            let histories = self.histories.read().await;
            if let Some(messages) = histories.get(persona_id) {
                return Ok(Some(messages.clone()));
            }
        }

        let Some(messages) = self.repository.load(persona_id).await? else {
            return Ok(None);
        };

        let mut histories = self.histories.write().await;
        histories.insert(persona_id.to_string(), messages.clone());
        Ok(Some(messages))
    }

    /// Appends a message and persists the log.
    pub async fn append(&self, persona_id: &str, message: Message) -> Result<()> {
        let mut histories = self.histories.write().await;
        let log = histories.entry(persona_id.to_string()).or_default();
        log.push(message);
        self.repository.save(persona_id, log).await
    }

    /// Patches one message's content/status and persists the log.
    pub async fn update(
        &self,
        persona_id: &str,
        message_id: &str,
        patch: MessagePatch,
    ) -> Result<Message> {
        let mut histories = self.histories.write().await;
        let log = histories
            .get_mut(persona_id)
            .ok_or_else(|| KindredError::not_found("transcript", persona_id))?;
        let message = log
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| KindredError::not_found("message", message_id))?;

        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(status) = patch.status {
            message.status = Some(status);
        }
        let updated = message.clone();
        self.repository.save(persona_id, log).await?;
        Ok(updated)
    }

    /// Replaces and persists a persona's whole log.
    pub async fn save(&self, persona_id: &str, messages: Vec<Message>) -> Result<()> {
        let mut histories = self.histories.write().await;
        self.repository.save(persona_id, &messages).await?;
        histories.insert(persona_id.to_string(), messages);
        Ok(())
    }

    /// Drops a persona's transcript from memory and storage.
    pub async fn clear(&self, persona_id: &str) -> Result<()> {
        let mut histories = self.histories.write().await;
        histories.remove(persona_id);
        self.repository.delete(persona_id).await
    }
}
