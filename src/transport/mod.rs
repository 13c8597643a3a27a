//! Transport abstraction for outbound HTTP calls
//!
//! Every upstream service the crate talks to (MailboxLayer, Open-Meteo,
//! model providers) is reached through [`Transport`], so the clients can be
//! exercised against an in-process transport in tests.

pub mod auth;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use std::{collections::HashMap, pin::Pin};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use thiserror::Error;
use url::Url;

pub use auth::AuthCredentials;
pub use http::HttpTransport;

/// Errors raised while executing a transport request
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established
    #[error("Connection error: {0}")]
    Connect(String),

    /// The request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Any other HTTP-level failure
    #[error("{0}")]
    Http(String),

    /// Failure while reading a streamed body
    #[error("{0}")]
    Stream(String),

    /// The endpoint could not be turned into a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The method is not one the transport supports
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

/// Streamed response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Protocol-agnostic transport request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The endpoint path, relative to the transport's base URL
    pub endpoint: String,

    /// HTTP method (e.g., "POST", "GET")
    pub method: String,

    /// Query string parameters, in order
    pub query: Vec<(String, String)>,

    /// Headers for the request
    pub headers: HashMap<String, String>,

    /// Request body as bytes
    pub body: Bytes,
}

impl TransportRequest {
    /// Create a new transport request
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, "GET")
    }

    /// Shorthand for a POST request
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, "POST")
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Look up a query parameter by name
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Resolve the full URL against a base URL, query string included
    pub fn url(&self, base_url: &Url) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            base_url.as_str().trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// Protocol-agnostic transport response
#[derive(Debug)]
pub struct TransportResponse {
    /// Status code (e.g., HTTP status code)
    pub status: u16,

    /// Response headers
    pub headers: HashMap<String, String>,

    /// Response body as bytes
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header to the response
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Check if the response indicates success (2xx status code)
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Standard reason phrase for the status code, empty when unknown
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("")
    }
}

/// Core transport trait for executing requests
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Execute a request and buffer the whole response
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Execute a request and stream the response body
    ///
    /// Non-success statuses are reported as errors. The default
    /// implementation buffers the response and yields it as one chunk.
    async fn execute_streaming(&self, request: TransportRequest) -> Result<ByteStream, TransportError> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(TransportError::Http(format!(
                "HTTP streaming request failed with status {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            )));
        }
        Ok(Box::pin(stream::once(async move { Ok(response.body) })))
    }
}
