//! # openai-v1 - client for the OpenAI v1 HTTP API
//!
//! A small async client for the engines and chat completions endpoints,
//! with typed requests and results and Server-Sent Events streaming.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Closed registry of model identifiers and their wire names
//! - Optional request fields omitted on the wire when unset
//! - Streaming as a pull-based [`Stream`](futures::Stream) or via callbacks
//! - Pluggable [`Transport`](transport::Transport), reqwest by default
//!
//! ## Architecture
//!
//! - **[`engine`]**: [`EngineName`] / [`ChatModel`] and their wire strings
//! - **[`model`]**: request/response data carriers
//! - **[`client`]**: [`OpenAiClient`] and [`ClientError`]
//! - **[`api`]**: endpoint handles (`client.engines()`, `client.chat().completions()`)
//! - **[`sse`]** / **[`stream`]**: event framing and partial-result reassembly
//! - **[`transport`]** / **[`http`]** / **[`options`]**: the HTTP seam and its configuration
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use openai_v1::{ChatCompletionRequest, ChatMessage, ChatModel, OpenAiClient, TransportOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::new(TransportOptions::new("your-api-key"))?;
//!
//!     let request = ChatCompletionRequest::for_model(
//!         ChatModel::Gpt4Turbo,
//!         vec![
//!             ChatMessage::system("You are Yoda from Star Wars."),
//!             ChatMessage::user("Is Vader good or evil?"),
//!         ],
//!     )
//!     .with_max_tokens(64);
//!
//!     let mut stream = client.chat().completions().create_stream(request).await?;
//!     while let Some(frame) = stream.next().await {
//!         if let Some(text) = frame?.content() {
//!             print!("{}", text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod engine;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;
pub mod transport;

// Re-exports for convenience
pub use client::{ClientError, OpenAiClient};
pub use engine::{ChatModel, EngineName};
pub use model::{
    ChatChoice, ChatCompletion, ChatCompletionRequest, ChatMessage, Engine, EnginesList,
    FinishReason, Role, Stop, Usage,
};
pub use options::{SecretString, TransportOptions};
pub use stream::{ChatCompletionStream, StreamAccumulator};
pub use transport::{HttpTransport, Transport};
