//! MailboxLayer email verification client and tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    codec::json::truthy_field,
    transport::{HttpTransport, Transport, TransportError, TransportRequest},
};

use super::{validate_email, Tool, ToolError};

/// Public MailboxLayer API host
pub const MAILBOXLAYER_BASE_URL: &str = "https://apilayer.net";

/// Environment variable holding the access key
pub const MAILBOXLAYER_KEY_VAR: &str = "MAILBOXLAYER_API_KEY";

const CHECK_ENDPOINT: &str = "api/check";

/// Errors raised while verifying an address
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Missing {MAILBOXLAYER_KEY_VAR} environment variable")]
    MissingApiKey,

    /// Non-success HTTP status
    #[error("MailboxLayer HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// HTTP 200 carrying `{"success": false, "error": {...}}`
    #[error("MailboxLayer API error {code}: {info}")]
    Api { code: i64, info: String },

    #[error("Exception while contacting MailboxLayer: {0}")]
    Transport(#[from] TransportError),

    #[error("Exception while contacting MailboxLayer: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Optional checks requested from the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub smtp: bool,
    pub format: bool,
}

impl CheckOptions {
    /// SMTP and format checks enabled
    pub fn full() -> Self {
        Self {
            smtp: true,
            format: true,
        }
    }
}

/// Raw upstream answer, kept as JSON so flags can be read by truthiness
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResponse(pub Value);

impl CheckResponse {
    pub fn flag(&self, key: &str) -> bool {
        truthy_field(&self.0, key)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn score(&self) -> Option<f64> {
        self.0.get("score").and_then(Value::as_f64)
    }
}

/// Normalized verification record returned by the tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    /// Normalized email returned by MailboxLayer
    pub email: String,
    /// Typo suggestion
    pub did_you_mean: Option<String>,
    pub format_valid: bool,
    pub mx_found: bool,
    /// Whether the SMTP check passed (deliverable)
    pub smtp_check: bool,
    /// Whether the domain accepts all addresses
    pub catch_all: bool,
    pub disposable: bool,
    /// Whether the address belongs to a free provider
    pub free: bool,
    /// Confidence score in [0, 1]
    pub score: Option<f64>,
    pub domain: Option<String>,
    /// Set when verification could not be performed
    pub error: Option<String>,
}

impl VerificationResult {
    /// A result carrying only an error
    pub fn failed(email: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            did_you_mean: None,
            format_valid: false,
            mx_found: false,
            smtp_check: false,
            catch_all: false,
            disposable: false,
            free: false,
            score: None,
            domain: None,
            error: Some(error.into()),
        }
    }

    /// Map an upstream answer for `requested` into the record
    pub fn from_response(requested: &str, response: &CheckResponse) -> Self {
        Self {
            email: response.string("email").unwrap_or_else(|| requested.to_string()),
            did_you_mean: response.string("did_you_mean").filter(|s| !s.is_empty()),
            format_valid: response.flag("format_valid"),
            mx_found: response.flag("mx_found"),
            smtp_check: response.flag("smtp_check"),
            catch_all: response.flag("catch_all"),
            disposable: response.flag("disposable"),
            free: response.flag("free"),
            score: response.score(),
            domain: response.string("domain"),
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Client for the MailboxLayer `check` endpoint
#[derive(Debug, Clone)]
pub struct MailboxLayerClient<T = HttpTransport> {
    transport: T,
    api_key: Option<String>,
}

impl MailboxLayerClient<HttpTransport> {
    /// Client for the public API
    pub fn public(api_key: Option<String>) -> Result<Self, TransportError> {
        let base_url = Url::parse(MAILBOXLAYER_BASE_URL)?;
        Ok(Self::new(HttpTransport::new(base_url), api_key))
    }
}

impl<T: Transport> MailboxLayerClient<T> {
    pub fn new(transport: T, api_key: Option<String>) -> Self {
        Self {
            transport,
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Query the API for `email`.
    ///
    /// Fails without touching the network when no key is configured.
    pub async fn check(&self, email: &str, options: CheckOptions) -> Result<CheckResponse, VerifyError> {
        let api_key = self.api_key.as_deref().ok_or(VerifyError::MissingApiKey)?;

        let mut request = TransportRequest::get(CHECK_ENDPOINT)
            .query("access_key", api_key)
            .query("email", email);
        if options.smtp {
            request = request.query("smtp", "1");
        }
        if options.format {
            request = request.query("format", "1");
        }

        debug!(email, smtp = options.smtp, format = options.format, "checking address");
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(VerifyError::Http {
                status: response.status,
                reason: response.reason().to_string(),
            });
        }

        let body: Value = serde_json::from_slice(&response.body)?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            let error = body.get("error").cloned().unwrap_or(Value::Null);
            return Err(VerifyError::Api {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                info: error
                    .get("info")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(CheckResponse(body))
    }

    /// Verify `email`, folding every failure into the record's `error` field
    pub async fn verify(&self, email: &str) -> VerificationResult {
        match self.check(email, CheckOptions::default()).await {
            Ok(response) => VerificationResult::from_response(email, &response),
            Err(e) => {
                warn!(email, error = %e, "verification failed");
                VerificationResult::failed(email, e.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyInput {
    email: String,
}

/// Tool wrapping [`MailboxLayerClient::verify`]
#[derive(Debug, Clone)]
pub struct MailboxLayerTool<T = HttpTransport> {
    client: MailboxLayerClient<T>,
}

impl<T: Transport> MailboxLayerTool<T> {
    pub fn new(client: MailboxLayerClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport> Tool for MailboxLayerTool<T> {
    fn id(&self) -> &str {
        "mailboxlayer-verify"
    }

    fn description(&self) -> &str {
        "Verify an email address using the MailboxLayer API. Returns structured verification data (format, mx, smtp, disposable, score, etc.)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "email": {
                    "type": "string",
                    "format": "email",
                    "description": "The email address to verify (e.g. user@example.com)"
                }
            },
            "required": ["email"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: Value) -> Result<Value, ToolError> {
        let input: VerifyInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        validate_email(&input.email)?;

        let result = self.client.verify(&input.email).await;
        Ok(serde_json::to_value(result)?)
    }
}
