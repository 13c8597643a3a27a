//! HTTP transport implementation

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use tracing::debug;
use url::Url;

use super::{ByteStream, Transport, TransportError, TransportRequest, TransportResponse};

/// HTTP transport implementation using reqwest
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the upstream service (e.g., "<https://apilayer.net>")
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a new HTTP transport with a custom reqwest client
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { client, base_url }
    }

    /// Create a transport whose requests give up after `timeout`.
    ///
    /// `None` leaves requests unbounded.
    pub fn with_timeout(base_url: Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(base_url, builder.build()?))
    }

    fn build(&self, request: TransportRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = request.url(&self.base_url)?;

        let mut req_builder = match request.method.as_str() {
            "POST" => self.client.post(url),
            "GET" => self.client.get(url),
            "PUT" => self.client.put(url),
            "DELETE" => self.client.delete(url),
            other => return Err(TransportError::UnsupportedMethod(other.to_string())),
        };

        for (key, value) in request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        Ok(req_builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        debug!(method = %request.method, endpoint = %request.endpoint, host = ?self.base_url.host_str(), "outbound request");

        let response = self.build(request)?.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_streaming(&self, request: TransportRequest) -> Result<ByteStream, TransportError> {
        debug!(method = %request.method, endpoint = %request.endpoint, host = ?self.base_url.host_str(), "outbound streaming request");

        let response = self
            .build(request.header("Accept", "text/event-stream"))?
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!(
                "HTTP streaming request failed with status {}: {}",
                status, body
            )));
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(Url::parse("https://example.com/v1").unwrap());
        let url = transport.build(TransportRequest::get("models")).unwrap().build().unwrap().url().clone();
        assert_eq!(url.as_str(), "https://example.com/v1/models");
    }

    #[test]
    fn test_unsupported_method() {
        let transport = HttpTransport::new(Url::parse("https://example.com").unwrap());
        let result = transport.build(TransportRequest::new("/x", "PATCH"));
        assert!(matches!(result, Err(TransportError::UnsupportedMethod(m)) if m == "PATCH"));
    }
}
