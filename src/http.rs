//! HTTP client utilities shared by the reqwest transport.
//!
//! This module provides client construction, header handling and a logged
//! variant of the JSON body helper.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::client::ClientError;
use crate::options::TransportOptions;

/// Build a configured HTTP client from transport options.
///
/// This applies timeouts, proxies and the default headers every request
/// carries (bearer credential, organization, content type).
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder().default_headers(default_headers(transport_options)?);

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("Invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

fn default_headers(transport_options: &TransportOptions) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut bearer = HeaderValue::from_str(&format!(
        "Bearer {}",
        transport_options.api_key.expose_secret()
    ))
    .map_err(|_| ClientError::Config("Invalid API key".to_string()))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);

    if let Some(organization) = &transport_options.organization {
        let value = HeaderValue::from_str(organization)
            .map_err(|_| ClientError::Config("Invalid organization".to_string()))?;
        headers.insert("OpenAI-Organization", value);
    }

    Ok(headers)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// Request helpers that trace what goes over the wire.
pub trait RequestBuilderExt {
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: Serialize + ?Sized>(self, body: &T) -> Self {
        if tracing::enabled!(tracing::Level::TRACE) {
            match serde_json::to_string(body) {
                Ok(json) => tracing::trace!(body = %json, "request body"),
                Err(e) => tracing::trace!(error = %e, "request body is not serializable"),
            }
        }
        self.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client() {
        let transport_options =
            TransportOptions::new("test").with_timeout(Duration::from_secs(30));

        let client = build_http_client(&transport_options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let transport_options =
            TransportOptions::new("test").with_proxy("http://proxy.example.com:8080");

        let client = build_http_client(&transport_options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_headers_carry_bearer_and_organization() {
        let transport_options = TransportOptions::new("sk-test").with_organization("org-1");
        let headers = default_headers(&transport_options).unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
        assert!(headers[AUTHORIZATION].is_sensitive());
        assert_eq!(headers["OpenAI-Organization"], "org-1");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_api_key_with_newline_is_a_config_error() {
        let transport_options = TransportOptions::new("sk-\nbroken");
        let err = default_headers(&transport_options).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
