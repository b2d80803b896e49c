//! Transcript domain module: message types, persistence trait and the store.

mod message;
mod repository;
mod store;

pub use message::{DeliveryStatus, Message, MessagePatch, MessageRole};
pub use repository::TranscriptRepository;
pub use store::TranscriptStore;
