//! Endpoint groups of the v1 API.

pub mod chat;
pub mod engines;

pub use chat::{Chat, ChatCompletions};
pub use engines::Engines;
