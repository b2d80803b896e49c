//! The AI capability boundary.
//!
//! Four remote operations back the whole application: conversation creation,
//! streamed reply generation, speech synthesis and image generation. They are
//! modelled as traits so the engine, the assists and every test can treat the
//! provider as an opaque remote capability with the latency and failure
//! profile of a network call.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::error::{ChatError, GenerationError, SynthesisError};

/// Author of one committed conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

/// One committed turn of a provider conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

/// Opaque handle to one provider-side conversation.
///
/// Holds the instruction the conversation was created with and the committed
/// turn log the chat capability replays on each send. Consumers identify
/// handles by [`SessionHandle::id`] and never look inside; the session store
/// decides validity purely by comparing instruction strings.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    system_instruction: String,
    temperature: f32,
    turns: Arc<Mutex<Vec<Turn>>>,
}

impl SessionHandle {
    pub fn new(system_instruction: impl Into<String>, temperature: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            system_instruction: system_instruction.into(),
            temperature,
            turns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Unique id of this conversation; two handles are the same conversation
    /// iff their ids match.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// The committed turns so far, oldest first.
    pub async fn turns(&self) -> Vec<Turn> {
        self.turns.lock().await.clone()
    }

    /// Commits one completed user/model exchange.
    ///
    /// Called only after a reply stream finished normally, so a failed
    /// exchange leaves the conversation context untouched.
    pub async fn commit_exchange(&self, user_text: &str, model_text: &str) {
        let mut turns = self.turns.lock().await;
        turns.push(Turn {
            role: TurnRole::User,
            text: user_text.to_string(),
        });
        turns.push(Turn {
            role: TurnRole::Model,
            text: model_text.to_string(),
        });
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// A finite, non-restartable sequence of reply fragments.
///
/// Fragments arrive in order; concatenating them reconstructs the full
/// reply. Once `next` returns `None` the stream is exhausted. A failure is
/// delivered as the final `Err` item; fragments already delivered are never
/// retracted.
pub struct ReplyStream {
    rx: mpsc::Receiver<Result<String, ChatError>>,
}

impl ReplyStream {
    /// Creates a sender/stream pair; the producing task pushes fragments and
    /// closes the channel when the reply is complete.
    pub fn channel() -> (mpsc::Sender<Result<String, ChatError>>, ReplyStream) {
        let (tx, rx) = mpsc::channel(32);
        (tx, ReplyStream { rx })
    }

    /// The next fragment, an error, or `None` when exhausted.
    pub async fn next(&mut self) -> Option<Result<String, ChatError>> {
        self.rx.recv().await
    }
}

/// Conversation creation and streamed reply generation.
#[async_trait::async_trait]
pub trait ChatCapability: Send + Sync {
    /// Creates a provider conversation seeded with a system instruction.
    async fn open_session(
        &self,
        system_instruction: &str,
        temperature: f32,
    ) -> Result<SessionHandle, ChatError>;

    /// Sends one user turn and streams the reply.
    async fn stream_message(
        &self,
        session: &SessionHandle,
        text: &str,
    ) -> Result<ReplyStream, ChatError>;
}

/// One-shot text-to-speech: returns raw little-endian 16-bit PCM samples.
#[async_trait::async_trait]
pub trait SpeechCapability: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// One-shot image generation: returns an inline `data:` image reference, or
/// `None` when the provider produced nothing usable.
#[async_trait::async_trait]
pub trait ImageCapability: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, GenerationError>;
}
