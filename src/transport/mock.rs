use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

type Handler = dyn Fn(TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Mock transport for internal testing
///
/// Requests are answered by a closure and recorded so tests can assert on
/// what was sent.
#[derive(Clone)]
pub(crate) struct MockTransport {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
}

impl MockTransport {
    /// Create a new mock transport with a custom request handler
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Self::fallible(move |req| Ok(handler(req)))
    }

    /// Create a mock transport whose handler may fail
    pub fn fallible<F>(handler: F) -> Self
    where
        F: Fn(TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock transport that always answers with `status` and a JSON body
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::new(move |_| TransportResponse::new(status).body(body.to_string()))
    }

    /// Requests seen so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport").finish()
    }
}
