//! Validation layer for inbound JSON-RPC envelopes and outbound tasks

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;
use tracing::debug;

use crate::{
    protocol::{error::A2AError, task::TaskState},
    service::{A2aRequest, A2aResponse},
};

/// Layer that rejects malformed envelopes before they reach the adapter
#[derive(Clone, Debug, Default)]
pub struct EnvelopeValidationLayer;

impl EnvelopeValidationLayer {
    /// Create a new validation layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for EnvelopeValidationLayer {
    type Service = EnvelopeValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        EnvelopeValidationService { inner }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone, Debug)]
pub struct EnvelopeValidationService<S> {
    inner: S,
}

impl<S> EnvelopeValidationService<S> {
    /// Version tag must be `"2.0"` and the id present and truthy
    fn validate_request(req: &A2aRequest) -> Result<(), A2AError> {
        if !req.envelope.is_well_formed() {
            debug!(agent = %req.agent_id, "rejecting malformed envelope");
            return Err(A2AError::invalid_envelope());
        }
        Ok(())
    }

    /// A response must be a completed task with the agent's artifact
    fn validate_response(resp: &A2aResponse) -> Result<(), A2AError> {
        if resp.task.status.state != TaskState::Completed {
            return Err(A2AError::Other(format!(
                "Task {} finished in unexpected state {:?}",
                resp.task.id, resp.task.status.state
            )));
        }
        if resp.task.artifacts.is_empty() {
            return Err(A2AError::Other("Completed task must have artifacts".into()));
        }
        Ok(())
    }
}

impl<S> Service<A2aRequest> for EnvelopeValidationService<S>
where
    S: Service<A2aRequest, Response = A2aResponse, Error = A2AError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = A2aResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: A2aRequest) -> Self::Future {
        if let Err(e) = Self::validate_request(&req) {
            return Box::pin(async move { Err(e) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(req).await?;
            Self::validate_response(&response)?;
            Ok(response)
        })
    }
}
