//! Session store: one cached provider conversation per persona.
//!
//! Provider sessions are created with the instruction baked in and cannot be
//! patched afterwards, so identity-of-instruction is the cache-validity key:
//! a cached session is reused only while its recorded instruction equals the
//! persona's current one. Editing a persona's behaviour therefore takes
//! effect on the next send without a manual reset.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::RwLock;

use kindred_core::persona::Persona;

use crate::error::ChatError;
use crate::provider::{ChatCapability, SessionHandle};

/// Sampling temperature for roleplay conversations.
pub const CHAT_TEMPERATURE: f32 = 0.9;

struct CachedSession {
    handle: SessionHandle,
    /// The persona's system prompt at creation time; the validity key.
    instruction: String,
}

/// Maps persona identity to its live provider conversation.
pub struct SessionStore {
    backend: Arc<dyn ChatCapability>,
    sessions: RwLock<HashMap<String, CachedSession>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn ChatCapability>) -> Self {
        Self {
            backend,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> Arc<dyn ChatCapability> {
        self.backend.clone()
    }

    /// Returns the persona's session, creating or recreating it when absent
    /// or stale.
    pub async fn get_session(&self, persona: &Persona) -> Result<SessionHandle, ChatError> {
        {
            let sessions = self.sessions.read().await;
            if let Some(cached) = sessions.get(&persona.id) {
                if cached.instruction == persona.system_prompt {
                    return Ok(cached.handle.clone());
                }
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have created it while we waited for the lock.
        if let Some(cached) = sessions.get(&persona.id) {
            if cached.instruction == persona.system_prompt {
                return Ok(cached.handle.clone());
            }
        }

        let instruction = session_instruction(persona);
        let handle = self
            .backend
            .open_session(&instruction, CHAT_TEMPERATURE)
            .await?;
        debug!(
            "opened session {} for persona '{}'",
            handle.id(),
            persona.id
        );

        sessions.insert(
            persona.id.clone(),
            CachedSession {
                handle: handle.clone(),
                instruction: persona.system_prompt.clone(),
            },
        );
        Ok(handle)
    }

    /// Unconditionally discards the cached session for a persona.
    ///
    /// The next send creates a fresh provider conversation.
    pub async fn reset(&self, persona_id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(persona_id).is_some() {
            debug!("reset session for persona '{persona_id}'");
        }
    }
}

/// The full instruction a session is seeded with: the persona's behaviour
/// prompt plus the fixed conversation-style ground rules.
pub fn session_instruction(persona: &Persona) -> String {
    let style = format!(
        "CONVERSATION STYLE:\n\
         - Always respond as {role} named {name}.\n\
         - Use casual, real-human texting style.\n\
         - Never use formal AI language like \"I understand\" or \"As an AI\".\n\
         - Support the user's language (English, Urdu, etc.) automatically.\n\
         - Stay concise and emotional.",
        role = persona.role,
        name = persona.name,
    );
    format!("{}\n\n{}", persona.system_prompt, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ReplyStream;
    use kindred_core::persona::default_presets;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingChat {
        opened: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChatCapability for CountingChat {
        async fn open_session(
            &self,
            system_instruction: &str,
            temperature: f32,
        ) -> Result<SessionHandle, ChatError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(SessionHandle::new(system_instruction, temperature))
        }

        async fn stream_message(
            &self,
            _session: &SessionHandle,
            _text: &str,
        ) -> Result<ReplyStream, ChatError> {
            let (_tx, stream) = ReplyStream::channel();
            Ok(stream)
        }
    }

    fn husband() -> Persona {
        default_presets()
            .into_iter()
            .find(|p| p.id == "husband")
            .unwrap()
    }

    #[tokio::test]
    async fn test_same_handle_while_prompt_unchanged() {
        let backend = Arc::new(CountingChat::default());
        let store = SessionStore::new(backend.clone());
        let persona = husband();

        let first = store.get_session(&persona).await.unwrap();
        let second = store.get_session(&persona).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prompt_change_invalidates_session() {
        let backend = Arc::new(CountingChat::default());
        let store = SessionStore::new(backend.clone());
        let mut persona = husband();

        let first = store.get_session(&persona).await.unwrap();

        persona.system_prompt = "You are extremely formal now.".to_string();
        let second = store.get_session(&persona).await.unwrap();
        assert_ne!(first.id(), second.id());
        assert!(
            second
                .system_instruction()
                .starts_with("You are extremely formal now.")
        );
        assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_forces_new_session() {
        let backend = Arc::new(CountingChat::default());
        let store = SessionStore::new(backend);
        let persona = husband();

        let first = store.get_session(&persona).await.unwrap();
        store.reset(&persona.id).await;
        let second = store.get_session(&persona).await.unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_personas_have_independent_sessions() {
        let backend = Arc::new(CountingChat::default());
        let store = SessionStore::new(backend);
        let presets = default_presets();

        let a = store.get_session(&presets[0]).await.unwrap();
        let b = store.get_session(&presets[1]).await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_session_instruction_includes_style_block() {
        let persona = husband();
        let instruction = session_instruction(&persona);
        assert!(instruction.starts_with(&persona.system_prompt));
        assert!(instruction.contains("CONVERSATION STYLE:"));
        assert!(instruction.contains("Husband named Bilal Abbas Khan"));
        assert!(instruction.contains("Stay concise and emotional."));
    }
}
