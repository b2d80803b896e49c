//! Kindred application layer: the chat service and its default wiring.

pub mod bootstrap;
pub mod chat_service;

pub use bootstrap::bootstrap;
pub use chat_service::{APOLOGY_MESSAGE, ChatService};
