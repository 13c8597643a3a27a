//! Inbound adapter request

use serde_json::Value;

use crate::{codec::JsonRpcRequest, protocol::error::A2AError};

/// A JSON-RPC envelope addressed to one agent
#[derive(Debug, Clone, PartialEq)]
pub struct A2aRequest {
    /// Agent id taken from the route path
    pub agent_id: String,

    /// The decoded envelope
    pub envelope: JsonRpcRequest,
}

impl A2aRequest {
    pub fn new(agent_id: impl Into<String>, envelope: JsonRpcRequest) -> Self {
        Self {
            agent_id: agent_id.into(),
            envelope,
        }
    }

    /// Decode a raw request body.
    ///
    /// A body that is not JSON is a fault; JSON that is not an object is
    /// left for envelope validation to reject.
    pub fn from_body(agent_id: impl Into<String>, body: &[u8]) -> Result<Self, A2AError> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(Self::new(agent_id, JsonRpcRequest::from_value(value)))
    }

    /// The raw request id, if any
    pub fn request_id(&self) -> Option<&Value> {
        self.envelope.id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body() {
        let req = A2aRequest::from_body("weather-agent", br#"{"jsonrpc":"2.0","id":7}"#).unwrap();
        assert_eq!(req.agent_id, "weather-agent");
        assert_eq!(req.request_id(), Some(&Value::from(7)));
        assert!(req.envelope.is_well_formed());
    }

    #[test]
    fn test_from_body_rejects_non_json() {
        let err = A2aRequest::from_body("weather-agent", b"not json").unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_non_object_body_is_malformed_envelope() {
        let req = A2aRequest::from_body("weather-agent", b"[1, 2]").unwrap();
        assert!(!req.envelope.is_well_formed());
    }
}
