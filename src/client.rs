//! Client entry point and error types.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::api::chat::Chat;
use crate::api::engines::Engines;
use crate::options::TransportOptions;
use crate::transport::{ApiRequest, HttpTransport, RawResponse, Transport};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        error_type: Option<String>,
        code: Option<String>,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Bytes arrived but are not valid text.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the remote service answered with an error of its own.
    pub fn is_api(&self) -> bool {
        matches!(self, ClientError::Api { .. })
    }

    /// HTTP status of an API error, or of the failed HTTP exchange.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build an error from a non-2xx response body.
    ///
    /// Structured `{"error": {...}}` bodies are unpacked; anything else is
    /// kept verbatim as the message.
    pub fn handle_error_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(resp) => resp.error.into_client_error(status),
            Err(_) => ClientError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
                error_type: None,
                code: None,
            },
        }
    }

    pub(crate) async fn from_response(response: RawResponse) -> Self {
        let status = response.status;
        let error = match response.text().await {
            Ok(body) => Self::handle_error_response(status, &body),
            Err(e) => e,
        };
        tracing::warn!(status, error = %error, "request failed");
        error
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn into_client_error(self, status: u16) -> ClientError {
        let code = self.code.and_then(|code| match code {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        ClientError::Api {
            status,
            message: self.message,
            error_type: self.error_type,
            code,
        }
    }
}

/// Client for the v1 API.
///
/// Cheap to clone; clones share the transport. Each call is independent:
/// one request, no retries, nothing cached.
///
/// # Example
/// ```no_run
/// use openai_v1::{ChatCompletionRequest, ChatMessage, ChatModel, OpenAiClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = OpenAiClient::from_env()?;
///
///     let request = ChatCompletionRequest::for_model(
///         ChatModel::Gpt4Turbo,
///         vec![ChatMessage::user("Hello!")],
///     );
///     let completion = client.chat().completions().create(request).await?;
///     println!("{:?}", completion.content());
///     Ok(())
/// }
/// ```
pub struct OpenAiClient<T = HttpTransport> {
    transport: Arc<T>,
}

impl<T> Clone for OpenAiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for OpenAiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient").finish_non_exhaustive()
    }
}

impl OpenAiClient<HttpTransport> {
    /// Create a client talking HTTP with the given options.
    pub fn new(transport_options: TransportOptions) -> Result<Self, ClientError> {
        Ok(Self::with_transport(HttpTransport::new(transport_options)?))
    }

    /// Create a client configured from `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(TransportOptions::from_env()?)
    }
}

impl<T: Transport> OpenAiClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `/engines` endpoints.
    pub fn engines(&self) -> Engines<'_, T> {
        Engines::new(self)
    }

    /// `/chat/*` endpoints.
    pub fn chat(&self) -> Chat<'_, T> {
        Chat::new(self)
    }

    /// Send a request and return the raw response, failing on non-2xx.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::from_response(response).await);
        }
        Ok(response)
    }

    /// Send a request and decode the JSON body.
    pub(crate) async fn send_json<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, ClientError> {
        let body = self.send(request).await?.text_logged().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
