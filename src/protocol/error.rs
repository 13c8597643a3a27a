//! Error types for the A2A adapter

use thiserror::Error;

use crate::agent::AgentError;

/// JSON-RPC 2.0 error codes used by the adapter
pub mod codes {
    /// The envelope is not a valid request object
    pub const INVALID_REQUEST: i64 = -32600;

    /// The named agent is not registered
    pub const AGENT_NOT_FOUND: i64 = -32602;

    /// Any fault not covered by the other codes
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Main error type for A2A request handling
#[derive(Debug, Error)]
pub enum A2AError {
    /// The envelope failed validation
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    /// No agent is registered under the requested id
    #[error("Agent '{agent_id}' not found")]
    AgentNotFound { agent_id: String },

    /// Request body or params could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The agent failed while producing a response
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl A2AError {
    /// The envelope-level validation failure
    pub fn invalid_envelope() -> Self {
        A2AError::InvalidRequest(r#"jsonrpc must be "2.0" and id is required"#.to_string())
    }

    /// JSON-RPC error code for this error
    pub fn code(&self) -> i64 {
        match self {
            A2AError::InvalidRequest(_) => codes::INVALID_REQUEST,
            A2AError::AgentNotFound { .. } => codes::AGENT_NOT_FOUND,
            _ => codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            A2AError::InvalidRequest(_) => 400,
            A2AError::AgentNotFound { .. } => 404,
            _ => 500,
        }
    }

    /// Whether this error is reported as a generic internal error
    pub fn is_internal(&self) -> bool {
        self.code() == codes::INTERNAL_ERROR
    }
}

impl From<&str> for A2AError {
    fn from(s: &str) -> Self {
        A2AError::Other(s.to_string())
    }
}

impl From<String> for A2AError {
    fn from(s: String) -> Self {
        A2AError::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err = A2AError::invalid_envelope();
        assert_eq!(err.code(), -32600);
        assert_eq!(err.http_status(), 400);
        assert_eq!(
            err.to_string(),
            r#"Invalid Request: jsonrpc must be "2.0" and id is required"#
        );

        let err = A2AError::AgentNotFound {
            agent_id: "ghost".into(),
        };
        assert_eq!(err.code(), -32602);
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.to_string(), "Agent 'ghost' not found");

        let err = A2AError::from("boom");
        assert_eq!(err.code(), -32603);
        assert_eq!(err.http_status(), 500);
        assert!(err.is_internal());
    }
}
