//! JSON-backed transcript persistence: one key per persona.

use kindred_core::Result;
use kindred_core::transcript::{Message, TranscriptRepository};

use crate::json_store::JsonFileStore;

fn history_key(persona_id: &str) -> String {
    format!("history_{persona_id}")
}

/// Stores each persona's ordered message log under `history_<persona-id>`.
pub struct JsonTranscriptRepository {
    store: JsonFileStore,
}

impl JsonTranscriptRepository {
    pub fn new(store: JsonFileStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl TranscriptRepository for JsonTranscriptRepository {
    async fn load(&self, persona_id: &str) -> Result<Option<Vec<Message>>> {
        self.store.get(&history_key(persona_id)).await
    }

    async fn save(&self, persona_id: &str, messages: &[Message]) -> Result<()> {
        self.store
            .put(&history_key(persona_id), &messages.to_vec())
            .await
    }

    async fn delete(&self, persona_id: &str) -> Result<()> {
        self.store.remove(&history_key(persona_id)).await
    }
}
