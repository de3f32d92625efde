//! Server-Sent Events (SSE) stream processing utilities.
//!
//! SSE format:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```
//!
//! Only `data` fields matter for the chat endpoints. Consecutive `data`
//! lines of one event are joined with `\n` up to the blank line that ends
//! it. Comments (`: ...`) and other fields are skipped; the `[DONE]`
//! sentinel ends the stream and is never handed on as a payload.

use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;
use crate::transport::ByteStream;

/// Extension trait turning a response body into a stream of SSE payloads.
///
/// # Example
/// ```ignore
/// use openai_v1::sse::SSEStreamExt;
///
/// let mut stream = response.body.sse();
/// while let Some(result) = stream.next().await {
///     let data = result?;
///     println!("SSE data: {}", data);
/// }
/// ```
pub trait SSEStreamExt {
    /// Convert the body into a stream of raw SSE data payloads.
    ///
    /// Yields the joined `data` of each event. Stops when the `[DONE]`
    /// marker is encountered or the body ends. Bytes that are not UTF-8
    /// end the stream with [`ClientError::Decode`].
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

struct SseState {
    body: ByteStream,
    buffer: Vec<u8>,
    data: Option<String>,
    body_ended: bool,
    finished: bool,
}

impl SSEStreamExt for ByteStream {
    fn sse(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        let state = SseState {
            body: self,
            buffer: Vec::new(),
            data: None,
            body_ended: false,
            finished: false,
        };

        stream::unfold(state, |mut state| async move {
            if state.finished {
                return None;
            }

            loop {
                // Drain complete lines already buffered
                while let Some(pos) = state.buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                    match state.feed(&line) {
                        Ok(Some(Event::Data(data))) => return Some((Ok(data), state)),
                        Ok(Some(Event::Done)) => return None,
                        Ok(None) => continue,
                        Err(e) => {
                            state.finished = true;
                            return Some((Err(e), state));
                        }
                    }
                }

                if state.body_ended {
                    state.finished = true;
                    // An unterminated final line still belongs to the last event
                    let rest = std::mem::take(&mut state.buffer);
                    let event = match state.feed(&rest) {
                        Ok(Some(event)) => Some(event),
                        Ok(None) => state.dispatch(),
                        Err(e) => return Some((Err(e), state)),
                    };
                    return match event {
                        Some(Event::Data(data)) => Some((Ok(data), state)),
                        Some(Event::Done) | None => None,
                    };
                }

                match state.body.next().await {
                    Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(e), state));
                    }
                    None => state.body_ended = true,
                }
            }
        })
    }
}

enum Event {
    Data(String),
    Done,
}

impl SseState {
    /// Feed one line; a blank line completes the pending event.
    fn feed(&mut self, raw_line: &[u8]) -> Result<Option<Event>, ClientError> {
        let line = std::str::from_utf8(raw_line)
            .map_err(|e| ClientError::Decode(format!("Event stream is not UTF-8: {}", e)))?
            .trim();

        if line.is_empty() {
            return Ok(self.dispatch());
        }
        if let Some(data) = parse_sse_line(line) {
            match &mut self.data {
                Some(pending) => {
                    pending.push('\n');
                    pending.push_str(data);
                }
                None => self.data = Some(data.to_string()),
            }
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Option<Event> {
        let data = self.data.take()?;
        if is_done_marker(&data) {
            tracing::trace!("event stream done marker");
            return Some(Event::Done);
        }
        if data.is_empty() {
            return None;
        }
        tracing::trace!(data = %data, "event stream frame");
        Some(Event::Data(data))
    }
}

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>` (the space is optional).
///
/// # Example
/// ```
/// use openai_v1::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "invalid";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|s| s.trim())
}

/// Check if an SSE data line indicates the stream is done.
///
/// # Example
/// ```
/// use openai_v1::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn body(chunks: Vec<Result<&'static [u8], &'static str>>) -> ByteStream {
        Box::pin(stream::iter(chunks.into_iter().map(|chunk| {
            chunk
                .map(Bytes::from_static)
                .map_err(|reason| ClientError::Transport(reason.to_string()))
        })))
    }

    fn ok(chunk: &'static [u8]) -> Result<&'static [u8], &'static str> {
        Ok(chunk)
    }

    async fn collect(body: ByteStream) -> Vec<Result<String, ClientError>> {
        body.sse().collect().await
    }

    fn data(results: Vec<Result<String, ClientError>>) -> Vec<String> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(
            parse_sse_line("data: {\"key\": \"value\"}"),
            Some("{\"key\": \"value\"}")
        );
        assert_eq!(parse_sse_line("data:   spaces  "), Some("spaces"));
        assert_eq!(parse_sse_line("data:tight"), Some("tight"));
        assert_eq!(parse_sse_line("event: message"), None);
        assert_eq!(parse_sse_line("invalid"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_is_done_marker() {
        assert!(is_done_marker("[DONE]"));
        assert!(!is_done_marker(""));
        assert!(!is_done_marker("data"));
        assert!(!is_done_marker("{\"key\": \"value\"}"));
    }

    #[tokio::test]
    async fn test_frames_in_order_until_done() {
        let events = collect(body(vec![ok(
            b"data: {\"n\":1}\n\ndata: {\"n\":2}\n\ndata: [DONE]\n\ndata: {\"n\":3}\n\n",
        )]))
        .await;

        assert_eq!(data(events), vec!["{\"n\":1}", "{\"n\":2}"]);
    }

    #[tokio::test]
    async fn test_frame_split_across_chunks() {
        let events = collect(body(vec![
            ok(b"data: {\"text\":"),
            ok(b"\"hel"),
            ok(b"lo\"}\n"),
            ok(b"\ndata: [DONE]\n\n"),
        ]))
        .await;

        assert_eq!(data(events), vec!["{\"text\":\"hello\"}"]);
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let events = collect(body(vec![
            ok(b"data: caf\xC3"),
            ok(b"\xA9\n\n"),
        ]))
        .await;

        assert_eq!(data(events), vec!["café"]);
    }

    #[tokio::test]
    async fn test_comments_and_other_fields_are_skipped() {
        let events = collect(body(vec![ok(
            b": keep-alive\nevent: message\nid: 7\ndata: payload\r\n\r\n",
        )]))
        .await;

        assert_eq!(data(events), vec!["payload"]);
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_flushed() {
        let events = collect(body(vec![ok(b"data: first\n\ndata: last")])).await;
        assert_eq!(data(events), vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_body_without_frames_is_empty() {
        let events = collect(body(vec![])).await;
        assert!(events.is_empty());

        let events = collect(body(vec![ok(b"data: [DONE]\n\n")])).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_multiline_data_is_joined() {
        let events = collect(body(vec![ok(
            b"data: {\"a\":\ndata: 1}\n\ndata: single\n\n",
        )]))
        .await;

        assert_eq!(data(events), vec!["{\"a\":\n1}", "single"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_decode_error() {
        let events = collect(body(vec![
            ok(b"data: {\"id\":\"\xFF\"}\n\n"),
            ok(b"data: never\n\n"),
        ]))
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Err(ClientError::Decode(_))), "got {:?}", events[0]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let events = collect(body(vec![
            ok(b"data: one\n\n"),
            Err("connection reset"),
            ok(b"data: never\n\n"),
        ]))
        .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), "one");
        assert!(matches!(&events[1], Err(ClientError::Transport(msg)) if msg == "connection reset"));
    }
}
