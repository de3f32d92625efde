//! Transport configuration: credentials, endpoint and HTTP settings.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const ORGANIZATION_ENV: &str = "OPENAI_ORGANIZATION";

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Options used to build an [`HttpTransport`](crate::transport::HttpTransport).
///
/// # Example
/// ```rust
/// use openai_v1::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("sk-...")
///     .with_organization("org-123")
///     .with_timeout(Duration::from_secs(30));
///
/// assert_eq!(options.base_url, "https://api.openai.com/v1");
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Bearer credential sent with every request
    pub api_key: SecretString,

    /// Base URL the endpoint paths are appended to
    pub base_url: String,

    /// Sent as `OpenAI-Organization` when set
    pub organization: Option<String>,

    /// Request timeout
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl TransportOptions {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            timeout: None,
            proxy: None,
            extra_headers: None,
        }
    }

    /// Read `OPENAI_API_KEY`, and optionally `OPENAI_BASE_URL` and
    /// `OPENAI_ORGANIZATION`, from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ClientError::Config(format!("{} is not set", API_KEY_ENV)))?;

        let mut options = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.is_empty()) {
            options = options.with_base_url(base_url);
        }
        if let Some(organization) = lookup(ORGANIZATION_ENV).filter(|org| !org.is_empty()) {
            options = options.with_organization(organization);
        }
        Ok(options)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Join an endpoint path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
