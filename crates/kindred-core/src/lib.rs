//! Kindred core domain: personas, transcripts, conversation state and the
//! persistence traits binding them to storage.

pub mod chat_state;
pub mod error;
pub mod persona;
pub mod preferences;
pub mod transcript;

// Re-export common error type
pub use chat_state::ChatState;
pub use error::{KindredError, Result};
