//! Credentials attached to outbound requests

use super::TransportRequest;

/// Authentication credentials
#[derive(Clone)]
pub enum AuthCredentials {
    /// Bearer token authentication
    Bearer(String),
}

impl AuthCredentials {
    /// Create bearer token credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Get the header name and value for this credential
    pub fn to_header(&self) -> (String, String) {
        match self {
            AuthCredentials::Bearer(token) => {
                ("Authorization".to_string(), format!("Bearer {}", token))
            }
        }
    }

    /// Attach the credential header to a request
    pub fn apply(&self, request: TransportRequest) -> TransportRequest {
        let (header, value) = self.to_header();
        request.header(header, value)
    }
}

// Keeps secrets out of logs.
impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthCredentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}
