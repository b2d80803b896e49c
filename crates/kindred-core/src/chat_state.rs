//! Conversation status for the active exchange of one persona.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Where a persona's current exchange stands.
///
/// Ephemeral: tracked per persona while the process runs, never persisted.
/// A new send is accepted only from [`ChatState::Idle`]; after a failure the
/// engine parks the conversation in [`ChatState::Error`] and auto-recovers to
/// idle after a fixed delay so the user can retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Request issued, no fragment received yet.
    Loading,
    /// Receiving partial reply content.
    Streaming,
    /// The last exchange failed.
    Error,
}

impl ChatState {
    /// Whether a new send may start in this state.
    pub fn accepts_send(&self) -> bool {
        matches!(self, ChatState::Idle)
    }
}
