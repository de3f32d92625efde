//! Request and response models for the v1 API.
//!
//! Field names mirror the remote JSON exactly. Every optional sampling
//! control is skipped on the wire when `None`, so an explicit zero is always
//! distinguishable from "not set".

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::client::ClientError;
use crate::engine::{ChatModel, EngineName};

/// Role of the message sender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// The API sends `"content": null` for some assistant turns.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stop condition: one sequence or several.
///
/// Both shapes mean "stop at any of these", but they are kept apart on the
/// wire exactly as the caller built them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Stop {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for Stop {
    fn from(s: &str) -> Self {
        Stop::Single(s.to_string())
    }
}

impl From<String> for Stop {
    fn from(s: String) -> Self {
        Stop::Single(s)
    }
}

impl From<Vec<String>> for Stop {
    fn from(v: Vec<String>) -> Self {
        Stop::Many(v)
    }
}

impl<const N: usize> From<[&str; N]> for Stop {
    fn from(v: [&str; N]) -> Self {
        Stop::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Body of `POST /chat/completions`.
///
/// # Example
/// ```
/// use openai_v1::engine::ChatModel;
/// use openai_v1::model::{ChatCompletionRequest, ChatMessage};
///
/// let request = ChatCompletionRequest::for_model(ChatModel::Gpt4Turbo, vec![ChatMessage::user("hello")])
///     .with_temperature(0.0)
///     .with_stop("###")
///     .with_max_tokens(8);
///
/// let body = serde_json::to_value(&request).unwrap();
/// assert_eq!(body["model"], "gpt-4-turbo");
/// assert_eq!(body["temperature"], 0.0);
/// assert!(body.get("top_p").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Stop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Token id (as a string) to bias in [-100, 100].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    /// Create a request for a model given by its wire name.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }

    pub fn for_model(model: ChatModel, messages: Vec<ChatMessage>) -> Self {
        Self::new(model.as_str(), messages)
    }

    /// Create a request for an engine, failing if it cannot serve chat.
    pub fn for_engine(engine: EngineName, messages: Vec<ChatMessage>) -> Result<Self, ClientError> {
        let model = ChatModel::try_from(engine)?;
        Ok(Self::for_model(model, messages))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_n(mut self, n: u32) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<Stop>) -> Self {
        self.stop = Some(stop.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn with_logit_bias(mut self, logit_bias: HashMap<String, i32>) -> Self {
        self.logit_bias = Some(logit_bias);
        self
    }

    /// Add a single logit bias entry.
    pub fn with_token_bias(mut self, token: impl Into<String>, bias: i32) -> Self {
        self.logit_bias
            .get_or_insert_with(HashMap::new)
            .insert(token.into(), bias);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    FunctionCall,
    #[serde(other)]
    Other,
}

/// Incremental message content in a streamed frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    /// Set on non-streamed results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChatMessage>,
    /// Set on streamed frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<ChatDelta>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl ChatChoice {
    /// Text carried by this choice, whether full message or delta.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .or_else(|| self.delta.as_ref().and_then(|d| d.content.as_deref()))
    }
}

/// Token usage accounting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// A chat completion result.
///
/// Streamed frames (`chat.completion.chunk`) share this shape; their
/// choices carry a `delta` instead of a `message`.
///
/// `id`, `object` and `choices` are required on the wire; a payload
/// missing any of them is rejected rather than read as an empty result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().and_then(ChatChoice::text)
    }
}

/// An engine as reported by `GET /engines`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Engine {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub created: Option<u64>,
}

impl Engine {
    /// The registry entry for this engine, if the client knows it.
    pub fn name(&self) -> Option<EngineName> {
        self.id.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnginesList {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub data: Vec<Engine>,
}
