//! `/chat/completions` endpoint.
//!
//! Three call shapes are offered:
//!
//! - [`ChatCompletions::create`]: one request, one result.
//! - [`ChatCompletions::create_stream`]: a pull-based stream of partial
//!   results.
//! - [`ChatCompletions::create_streaming`]: the same stream pushed through
//!   callbacks, plus the accumulated result.
//!
//! In the callback forms the per-chunk handler runs sequentially in
//! arrival order and never after the completion handler, which runs
//! exactly once. Dropping the returned future stops delivery: no handler
//! is invoked afterwards.

use futures::StreamExt;

use crate::client::{ClientError, OpenAiClient};
use crate::model::{ChatCompletion, ChatCompletionRequest};
use crate::stream::{ChatCompletionStream, StreamAccumulator};
use crate::transport::{ApiRequest, Transport};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Handle for the `/chat` endpoints, obtained from [`OpenAiClient::chat`].
#[derive(Debug)]
pub struct Chat<'a, T> {
    client: &'a OpenAiClient<T>,
}

impl<'a, T: Transport> Chat<'a, T> {
    pub(crate) fn new(client: &'a OpenAiClient<T>) -> Self {
        Self { client }
    }

    pub fn completions(&self) -> ChatCompletions<'a, T> {
        ChatCompletions {
            client: self.client,
        }
    }
}

#[derive(Debug)]
pub struct ChatCompletions<'a, T> {
    client: &'a OpenAiClient<T>,
}

impl<'a, T: Transport> ChatCompletions<'a, T> {
    /// Create a completion and wait for the whole result.
    ///
    /// A request with `stream: Some(true)` is sent with streaming turned
    /// off; use [`create_stream`](Self::create_stream) for event streams.
    pub async fn create(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, ClientError> {
        if request.stream == Some(true) {
            request.stream = Some(false);
        }
        tracing::debug!(model = %request.model, messages = request.messages.len(), "creating chat completion");

        let body = serde_json::to_value(&request)?;
        self.client
            .send_json(ApiRequest::post(CHAT_COMPLETIONS_PATH, body))
            .await
    }

    /// Callback form of [`create`](Self::create).
    pub async fn create_with_handler<R>(&self, request: ChatCompletionRequest, on_result: R)
    where
        R: FnOnce(Result<ChatCompletion, ClientError>),
    {
        on_result(self.create(request).await);
    }

    /// Create a completion as a stream of partial results.
    ///
    /// Fails up front if the request cannot be sent or the service answers
    /// with an error status; later failures arrive as stream items.
    pub async fn create_stream(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<ChatCompletionStream, ClientError> {
        request.stream = Some(true);
        tracing::debug!(model = %request.model, messages = request.messages.len(), "creating chat completion stream");

        let body = serde_json::to_value(&request)?;
        let response = self
            .client
            .send(ApiRequest::post(CHAT_COMPLETIONS_PATH, body))
            .await?;

        Ok(ChatCompletionStream::new(response.status, response.body))
    }

    /// Stream a completion through callbacks.
    ///
    /// `on_partial` receives each frame with its zero-based index.
    /// `on_complete` fires once the stream has ended, successfully or not,
    /// including when no frame arrived. The returned value is the
    /// accumulated completion, or the failure that ended the stream; a
    /// stream cut short never yields a partial success.
    pub async fn create_streaming<P, C>(
        &self,
        request: ChatCompletionRequest,
        mut on_partial: P,
        on_complete: C,
    ) -> Result<ChatCompletion, ClientError>
    where
        P: FnMut(usize, ChatCompletion),
        C: FnOnce(),
    {
        let result = self.drive_stream(request, &mut on_partial).await;
        on_complete();

        match &result {
            Ok(completion) => {
                tracing::debug!(id = %completion.id, choices = completion.choices.len(), "chat completion stream finished")
            }
            Err(e) => tracing::warn!(error = %e, "chat completion stream failed"),
        }
        result
    }

    /// Like [`create_streaming`](Self::create_streaming), delivering the
    /// result to `on_result` after `on_complete`.
    pub async fn create_streaming_with_handlers<R, P, C>(
        &self,
        request: ChatCompletionRequest,
        on_result: R,
        on_partial: P,
        on_complete: C,
    ) where
        R: FnOnce(Result<ChatCompletion, ClientError>),
        P: FnMut(usize, ChatCompletion),
        C: FnOnce(),
    {
        on_result(self.create_streaming(request, on_partial, on_complete).await);
    }

    async fn drive_stream<P>(
        &self,
        request: ChatCompletionRequest,
        on_partial: &mut P,
    ) -> Result<ChatCompletion, ClientError>
    where
        P: FnMut(usize, ChatCompletion),
    {
        let mut stream = self.create_stream(request).await?;
        let mut accumulator = StreamAccumulator::new();

        while let Some(frame) = stream.next().await {
            let frame = frame?;
            let index = accumulator.frames();
            accumulator.push(&frame);
            on_partial(index, frame);
        }

        if accumulator.frames() == 0 {
            tracing::warn!("chat completion stream ended without frames");
        }
        Ok(accumulator.finish())
    }
}
