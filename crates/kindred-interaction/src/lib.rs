//! Kindred interaction: the AI provider boundary and everything that drives
//! it — session store, streaming chat engine, and the voice/avatar assists.

pub mod assist;
pub mod config;
pub mod engine;
pub mod error;
pub mod gemini;
pub mod provider;
pub mod session_store;

pub use assist::{AudioBuffer, AudioSink, AvatarAssist, SPEECH_SAMPLE_RATE, VoiceAssist};
pub use config::{GeminiCredentials, SecretConfig};
pub use engine::{ChatEngine, ERROR_RECOVERY_DELAY};
pub use error::{ChatError, ConfigError, GenerationError, SynthesisError};
pub use gemini::GeminiClient;
pub use provider::{
    ChatCapability, ImageCapability, ReplyStream, SessionHandle, SpeechCapability,
};
pub use session_store::{CHAT_TEMPERATURE, SessionStore};
