//! Streaming chat engine: drives one exchange and the conversation status.
//!
//! State machine per persona, owned here:
//! `idle -> loading` (request issued) `-> streaming` (first fragment)
//! `-> idle` (exhausted) or `-> error -> idle` (after a fixed delay, so the
//! user can retry). While a persona is not idle, new sends for it are
//! rejected; there is no queueing and no cancellation of an in-flight
//! exchange. Personas are fully independent of each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::RwLock;

use kindred_core::ChatState;
use kindred_core::persona::Persona;

use crate::error::ChatError;
use crate::provider::ReplyStream;
use crate::session_store::SessionStore;

/// How long a conversation stays in the error state before auto-recovering.
pub const ERROR_RECOVERY_DELAY: Duration = Duration::from_secs(2);

type StateMap = Arc<RwLock<HashMap<String, ChatState>>>;

/// Drives request/response exchanges and tracks per-persona status.
pub struct ChatEngine {
    sessions: Arc<SessionStore>,
    states: StateMap,
}

impl ChatEngine {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The persona's current conversation status.
    pub async fn state(&self, persona_id: &str) -> ChatState {
        self.states
            .read()
            .await
            .get(persona_id)
            .copied()
            .unwrap_or_default()
    }

    /// Sends one user message and returns the lazy fragment stream.
    ///
    /// Rejected with [`ChatError::Busy`] unless the persona is idle. The
    /// returned stream is finite and not restartable; exhausting it normally
    /// returns the persona to idle.
    pub async fn send(&self, persona: &Persona, text: &str) -> Result<ReplyStream, ChatError> {
        {
            let mut states = self.states.write().await;
            let state = states.entry(persona.id.clone()).or_default();
            if !state.accepts_send() {
                return Err(ChatError::Busy {
                    persona: persona.id.clone(),
                });
            }
            *state = ChatState::Loading;
        }

        let session = match self.sessions.get_session(persona).await {
            Ok(session) => session,
            Err(err) => {
                self.enter_error(&persona.id).await;
                return Err(err);
            }
        };

        let mut upstream = match self
            .sessions
            .backend()
            .stream_message(&session, text)
            .await
        {
            Ok(stream) => stream,
            Err(err) => {
                self.enter_error(&persona.id).await;
                return Err(err);
            }
        };

        let (tx, stream) = ReplyStream::channel();
        let states = self.states.clone();
        let persona_id = persona.id.clone();

        tokio::spawn(async move {
            while let Some(item) = upstream.next().await {
                match item {
                    Ok(fragment) => {
                        set_state(&states, &persona_id, ChatState::Streaming).await;
                        if tx.send(Ok(fragment)).await.is_err() {
                            // Consumer dropped the stream; the exchange still
                            // ran to completion from the provider's side.
                            set_state(&states, &persona_id, ChatState::Idle).await;
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("exchange with '{persona_id}' failed: {err}");
                        set_state(&states, &persona_id, ChatState::Error).await;
                        let _ = tx.send(Err(err)).await;
                        schedule_recovery(states, persona_id);
                        return;
                    }
                }
            }
            set_state(&states, &persona_id, ChatState::Idle).await;
        });

        Ok(stream)
    }

    async fn enter_error(&self, persona_id: &str) {
        set_state(&self.states, persona_id, ChatState::Error).await;
        schedule_recovery(self.states.clone(), persona_id.to_string());
    }
}

async fn set_state(states: &StateMap, persona_id: &str, state: ChatState) {
    states.write().await.insert(persona_id.to_string(), state);
}

/// Returns the conversation to idle once the error has been on screen for
/// the recovery delay.
fn schedule_recovery(states: StateMap, persona_id: String) {
    tokio::spawn(async move {
        tokio::time::sleep(ERROR_RECOVERY_DELAY).await;
        let mut states = states.write().await;
        if states.get(&persona_id) == Some(&ChatState::Error) {
            states.insert(persona_id, ChatState::Idle);
        }
    });
}
