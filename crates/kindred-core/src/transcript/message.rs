//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// Delivery status of a user message, as shown by the chat bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Seen,
}

/// A single message in a persona's transcript.
///
/// Content is mutable only while a model reply is streaming; a user
/// message's status flag is the one other mutable field. Everything else is
/// fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Present on user messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
}

impl Message {
    /// A user message, freshly sent.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            status: Some(DeliveryStatus::Sent),
        }
    }

    /// A model message.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Model,
            content: content.into(),
            timestamp: Utc::now(),
            status: None,
        }
    }

    /// The greeting seeded into an empty transcript when a persona is first
    /// opened.
    pub fn greeting(persona_name: &str) -> Self {
        Self::model(format!(
            "Hi! it's me, {persona_name}. I've been waiting for you to message. How are you feeling today?"
        ))
    }
}

/// Patch for the two mutable message fields.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub status: Option<DeliveryStatus>,
}

impl MessagePatch {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            status: None,
        }
    }

    pub fn status(status: DeliveryStatus) -> Self {
        Self {
            content: None,
            status: Some(status),
        }
    }
}
