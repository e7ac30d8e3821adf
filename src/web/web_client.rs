use std::collections::HashMap;
#[cfg(feature = "web-client")]
use std::time::Duration;

use async_trait::async_trait;
pub use http::Method;
#[cfg(feature = "web-client")]
use http::header::{HeaderMap, HeaderName, HeaderValue};
#[cfg(feature = "web-client")]
use tracing::{error, info, trace};

#[cfg(feature = "web-client")]
use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;

/// One http exchange as seen by the configuration sources.
#[derive(Debug, Clone)]
pub struct ConfHttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ConfHttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        ConfHttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add `headers`, each one replacing any header of the same name already set.
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        for (name, value) in headers {
            self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
            self.headers.push((name, value));
        }
        self
    }

    pub fn body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ConfHttpResponse {
    pub code: u16,
    /// Header names are lower case
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ConfHttpResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Status in [200, 400).
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.code)
    }
}

/// Performs an http style request/response exchange.
///
/// Implementations return [`crate::basic::error::ConfError::TransportFailure`] when no response
/// could be obtained; any status code, including errors, is a successful exchange.
#[async_trait]
pub trait ConfTransport: Send + Sync {
    async fn execute(&self, request: ConfHttpRequest) -> ConfResult<ConfHttpResponse>;
}

/// Transport backed by a [`reqwest::Client`].
#[cfg(feature = "web-client")]
pub struct ConfWebClient {
    default_headers: Vec<(String, String)>,
    client: reqwest::Client,
}

#[cfg(feature = "web-client")]
impl ConfWebClient {
    pub fn init(connect_timeout_sec: u64, request_timeout_sec: u64, accept_invalid_certs: bool) -> ConfResult<ConfWebClient> {
        info!("[ConfSource.WebClient] Initializing");
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .connect_timeout(Duration::from_secs(connect_timeout_sec))
            .timeout(Duration::from_secs(request_timeout_sec))
            .https_only(false)
            .build()?;
        info!("[ConfSource.WebClient] Initialized");
        Ok(ConfWebClient {
            client,
            default_headers: Vec::new(),
        })
    }

    pub fn init_by_conf(conf: &crate::config::config_dto::ConfClientConfig) -> ConfResult<ConfWebClient> {
        Self::init(conf.connect_timeout_sec, conf.request_timeout_sec, conf.accept_invalid_certs)
    }

    pub fn set_default_header(&mut self, key: &str, value: &str) {
        trace!("[ConfSource.WebClient] Set default header: {}={}", key, value);
        self.default_headers.push((key.to_string(), value.to_string()));
    }

    pub fn remove_default_header(&mut self, key: &str) {
        trace!("[ConfSource.WebClient] Remove default header: {}", key);
        self.default_headers.retain(|(k, _)| k != key);
    }
}

#[cfg(feature = "web-client")]
#[async_trait]
impl ConfTransport for ConfWebClient {
    async fn execute(&self, request: ConfHttpRequest) -> ConfResult<ConfHttpResponse> {
        let method_str = request.method.to_string();
        trace!("[ConfSource.WebClient] Request {}:{}", method_str, &request.url);
        let mut headers = HeaderMap::new();
        for (key, value) in self.default_headers.iter().chain(request.headers.iter()) {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| ConfError::FormatError(format!("[ConfSource.WebClient] Invalid header name {key}: {error}")))?;
            let value = HeaderValue::from_str(value).map_err(|error| ConfError::FormatError(format!("[ConfSource.WebClient] Invalid header value of {key}: {error}")))?;
            headers.insert(name, value);
        }
        let mut builder = self.client.request(request.method, &request.url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        let code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_lowercase(), v.to_string())))
            .collect();
        let body = response.text().await?;
        trace!("[ConfSource.WebClient] Request {}:{}, Response {}", method_str, request.url, code);
        Ok(ConfHttpResponse { code, headers, body })
    }
}

#[cfg(feature = "web-client")]
impl From<reqwest::Error> for ConfError {
    fn from(error: reqwest::Error) -> Self {
        error!("[ConfSource.WebClient] Error: {}", error.to_string());
        if error.is_decode() {
            ConfError::DecodeFailure(format!("[ConfSource.WebClient] {error}"))
        } else {
            ConfError::TransportFailure(format!("[ConfSource.WebClient] {error}"))
        }
    }
}
