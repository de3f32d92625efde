//! The seam between request dispatch and the network.
//!
//! Dispatch code only ever sees an [`ApiRequest`] going out and a
//! [`RawResponse`] coming back. [`HttpTransport`] is the reqwest
//! implementation; anything else implementing [`Transport`] can stand in
//! for it.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::Method;

use crate::client::ClientError;
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt};
use crate::options::TransportOptions;

/// Response body as it arrives from the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

/// A single outbound API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path relative to the base URL, e.g. `/chat/completions`.
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Status and body of a response, before any interpretation.
pub struct RawResponse {
    pub status: u16,
    pub body: ByteStream,
}

impl RawResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Collect the whole body as text.
    pub async fn text(self) -> Result<String, ClientError> {
        let bytes: Vec<u8> = self
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        String::from_utf8(bytes)
            .map_err(|e| ClientError::Decode(format!("Response body is not UTF-8: {}", e)))
    }

    /// Like [`text`](Self::text), tracing the body.
    pub async fn text_logged(self) -> Result<String, ClientError> {
        let status = self.status;
        let body = self.text().await?;
        tracing::trace!(status, body = %body, "response body");
        Ok(body)
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Sends one request and hands back the response body as a byte stream.
///
/// Implementations must not retry: each call is exactly one attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    options: TransportOptions,
}

impl HttpTransport {
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        let client = build_http_client(&options)?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let url = self.options.url(&request.path);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut req = self.client.request(request.method, &url);
        req = add_extra_headers(req, &self.options.extra_headers);
        if let Some(body) = &request.body {
            req = req.json_logged(body);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes_stream().map_err(ClientError::from);

        Ok(RawResponse::new(status, Box::pin(body)))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory transport for exercising dispatch without a network.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use futures::{future, stream, StreamExt};

    use super::*;

    /// One scripted piece of a response body.
    pub enum Part {
        Chunk(&'static str),
        Bytes(&'static [u8]),
        Fail(&'static str),
        /// Never yields; the body stays open.
        Stall,
    }

    pub struct Scripted {
        status: u16,
        parts: Vec<Part>,
    }

    impl Scripted {
        pub fn ok(body: &'static str) -> Self {
            Self {
                status: 200,
                parts: vec![Part::Chunk(body)],
            }
        }

        pub fn status(status: u16, body: &'static str) -> Self {
            Self {
                status,
                parts: vec![Part::Chunk(body)],
            }
        }

        pub fn parts(parts: Vec<Part>) -> Self {
            Self { status: 200, parts }
        }
    }

    #[derive(Default)]
    pub struct StubTransport {
        responses: Mutex<VecDeque<Result<Scripted, &'static str>>>,
        requests: Mutex<Vec<ApiRequest>>,
        calls: AtomicUsize,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, response: Scripted) -> Self {
            self.responses.lock().unwrap().push_back(Ok(response));
            self
        }

        /// Fail before any response is produced.
        pub fn refuse(self, reason: &'static str) -> Self {
            self.responses.lock().unwrap().push_back(Err(reason));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            let scripted = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
                .map_err(|reason| ClientError::Transport(reason.to_string()))?;

            let mut body: ByteStream = Box::pin(stream::empty::<Result<Bytes, ClientError>>());
            for part in scripted.parts {
                let item: Result<Bytes, ClientError> = match part {
                    Part::Chunk(text) => Ok(Bytes::from_static(text.as_bytes())),
                    Part::Bytes(raw) => Ok(Bytes::from_static(raw)),
                    Part::Fail(reason) => Err(ClientError::Transport(reason.to_string())),
                    Part::Stall => {
                        body = Box::pin(body.chain(stream::pending::<Result<Bytes, ClientError>>()));
                        continue;
                    }
                };
                body = Box::pin(body.chain(stream::once(future::ready(item))));
            }

            Ok(RawResponse::new(scripted.status, body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::stub::{Part, Scripted, StubTransport};
    use super::*;

    #[tokio::test]
    async fn test_text_collects_all_chunks() {
        let transport = StubTransport::new().respond(Scripted::parts(vec![
            Part::Chunk("{\"a\":"),
            Part::Chunk("1}"),
        ]));

        let response = transport.send(ApiRequest::get("/engines")).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.text().await.unwrap(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_text_surfaces_body_failure() {
        let transport = StubTransport::new().respond(Scripted::parts(vec![
            Part::Chunk("{\"a\":"),
            Part::Fail("connection reset"),
        ]));

        let response = transport.send(ApiRequest::get("/engines")).await.unwrap();
        let err = response.text().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn test_text_rejects_invalid_utf8_as_decode_error() {
        let transport = StubTransport::new().respond(Scripted::parts(vec![Part::Bytes(b"{\"id\":\"\xFF\"}")]));

        let response = transport.send(ApiRequest::get("/engines")).await.unwrap();
        let err = response.text().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_text_logged_returns_body() {
        let transport = StubTransport::new().respond(Scripted::status(500, "upstream down"));

        let response = transport.send(ApiRequest::get("/engines")).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.text_logged().await.unwrap(), "upstream down");
    }

    #[test]
    fn test_success_range() {
        let empty = || -> ByteStream { Box::pin(futures::stream::empty::<Result<Bytes, ClientError>>()) };
        assert!(RawResponse::new(200, empty()).is_success());
        assert!(RawResponse::new(204, empty()).is_success());
        assert!(!RawResponse::new(401, empty()).is_success());
        assert!(!RawResponse::new(500, empty()).is_success());
    }

    #[test]
    fn test_api_request_constructors() {
        let get = ApiRequest::get("/engines");
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());

        let post = ApiRequest::post("/chat/completions", serde_json::json!({ "model": "gpt-4" }));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body.unwrap()["model"], "gpt-4");
    }
}
