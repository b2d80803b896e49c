//! Errors for the provider boundary and the chat engine.
//!
//! Only the chat send path has a user-visible failure mode; speech synthesis
//! and image generation are best-effort and their errors never leave the
//! assist components.

use std::time::Duration;

use thiserror::Error;

/// Startup/configuration failures. Fatal: without a credential no provider
/// call can be made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is missing. Add it to {path} or set GEMINI_API_KEY")]
    MissingApiKey { path: String },

    #[error("failed to read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Invalid { path: String, message: String },
}

/// A chat exchange failed, or was rejected before it started.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The persona already has an exchange in flight.
    #[error("conversation with '{persona}' is busy")]
    Busy { persona: String },

    /// The request never reached the provider (connect/timeout/transport).
    #[error("chat request failed: {message}")]
    Transport { message: String, retryable: bool },

    /// The provider answered with an error status.
    #[error("chat API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The response body could not be understood.
    #[error("malformed chat response: {0}")]
    Malformed(String),

    /// The stream broke after it had started.
    #[error("chat stream interrupted: {0}")]
    Interrupted(String),
}

impl ChatError {
    /// Whether retrying the exchange may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Busy { .. } => false,
            ChatError::Transport { retryable, .. } => *retryable,
            ChatError::Api { retryable, .. } => *retryable,
            ChatError::Malformed(_) => false,
            ChatError::Interrupted(_) => true,
        }
    }
}

/// Speech synthesis failures; logged and swallowed by the voice assist.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech request failed: {0}")]
    Request(String),

    #[error("speech API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("speech response carried no audio payload")]
    NoAudio,

    #[error("audio decode failed: {0}")]
    Decode(String),

    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Avatar generation failures; logged and turned into "no image".
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("image request failed: {0}")]
    Request(String),

    #[error("image API error ({status}): {message}")]
    Api { status: u16, message: String },
}
