//! Streamed chat completions.
//!
//! [`ChatCompletionStream`] yields one partial [`ChatCompletion`] per SSE
//! frame, in arrival order. [`StreamAccumulator`] folds those frames back
//! into the single result a non-streamed call would have produced.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{future, Stream, StreamExt};
use itertools::Itertools;
use serde::Deserialize;

use crate::client::{ClientError, ErrorResponse};
use crate::model::{ChatChoice, ChatCompletion, ChatMessage, FinishReason, Role, Usage};
use crate::sse::SSEStreamExt;
use crate::transport::ByteStream;

/// A frame is either a completion chunk or an error reported in-band.
#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Error(ErrorResponse),
    Chunk(ChatCompletion),
}

/// Stream of partial chat completions.
///
/// Ends after the `[DONE]` marker, at the end of the body, or after the
/// first error. Dropping it releases the underlying connection.
pub struct ChatCompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<ChatCompletion, ClientError>> + Send>>,
}

impl ChatCompletionStream {
    pub(crate) fn new(status: u16, body: ByteStream) -> Self {
        let frames = body
            .sse()
            .map(move |data| -> Result<ChatCompletion, ClientError> {
                let data = data?;
                match serde_json::from_str::<Frame>(&data)? {
                    Frame::Chunk(chunk) => Ok(chunk),
                    Frame::Error(resp) => Err(resp.error.into_client_error(status)),
                }
            })
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = item.is_err();
                future::ready(Some(item))
            });

        Self {
            inner: Box::pin(frames),
        }
    }

    /// Drain the stream into a single accumulated completion.
    pub async fn collect_completion(mut self) -> Result<ChatCompletion, ClientError> {
        let mut accumulator = StreamAccumulator::new();
        while let Some(frame) = self.next().await {
            accumulator.push(&frame?);
        }
        Ok(accumulator.finish())
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<ChatCompletion, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ChatCompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionStream").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ChoiceState {
    role: Option<Role>,
    content: String,
    finish_reason: Option<FinishReason>,
}

/// Reassembles streamed frames into one completion.
///
/// Content is concatenated per choice index; the first role seen wins,
/// the last finish reason and usage win. Metadata (`id`, `model`,
/// `created`) comes from the first frame that carries it.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    id: String,
    model: String,
    created: u64,
    system_fingerprint: Option<String>,
    usage: Option<Usage>,
    choices: HashMap<u32, ChoiceState>,
    frames: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames pushed so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn push(&mut self, frame: &ChatCompletion) {
        self.frames += 1;

        if self.id.is_empty() {
            self.id.clone_from(&frame.id);
        }
        if self.model.is_empty() {
            self.model.clone_from(&frame.model);
        }
        if self.created == 0 {
            self.created = frame.created;
        }
        if self.system_fingerprint.is_none() {
            self.system_fingerprint.clone_from(&frame.system_fingerprint);
        }
        if frame.usage.is_some() {
            self.usage = frame.usage;
        }

        for choice in &frame.choices {
            let state = self.choices.entry(choice.index).or_default();

            let role = choice
                .delta
                .as_ref()
                .and_then(|d| d.role)
                .or_else(|| choice.message.as_ref().map(|m| m.role));
            if state.role.is_none() {
                state.role = role;
            }
            if let Some(text) = choice.text() {
                state.content.push_str(text);
            }
            if choice.finish_reason.is_some() {
                state.finish_reason = choice.finish_reason;
            }
        }
    }

    pub fn finish(self) -> ChatCompletion {
        let choices = self
            .choices
            .into_iter()
            .sorted_by_key(|(index, _)| *index)
            .map(|(index, state)| ChatChoice {
                index,
                message: Some(ChatMessage {
                    role: state.role.unwrap_or(Role::Assistant),
                    content: state.content,
                }),
                delta: None,
                finish_reason: state.finish_reason,
            })
            .collect();

        ChatCompletion {
            id: self.id,
            object: "chat.completion".to_string(),
            created: self.created,
            model: self.model,
            choices,
            usage: self.usage,
            system_fingerprint: self.system_fingerprint,
        }
    }
}
