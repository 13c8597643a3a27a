//! JSON-RPC 2.0 envelopes for the A2A binding
//!
//! Inbound envelopes are decoded leniently so that validation can report a
//! precise error instead of a decoding failure. Outbound envelopes always
//! carry `"jsonrpc": "2.0"` and exactly one of `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    codec::json::truthy,
    protocol::{error::A2AError, message::Message, task::Task},
};

/// Protocol version literal
pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound JSON-RPC 2.0 request envelope
///
/// Every field is optional here; [`JsonRpcRequest::is_well_formed`] decides
/// whether the envelope may proceed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: Option<Value>,
    pub id: Option<Value>,
    pub method: Option<Value>,
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Read an envelope out of an arbitrary JSON document.
    ///
    /// Anything other than an object yields an envelope with no fields.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };

        Self {
            jsonrpc: object.remove("jsonrpc"),
            id: object.remove("id"),
            method: object.remove("method"),
            params: object.remove("params"),
        }
    }

    /// Version tag equals the literal and the id is present and truthy
    pub fn is_well_formed(&self) -> bool {
        let version_ok = matches!(&self.jsonrpc, Some(Value::String(v)) if v == JSONRPC_VERSION);
        version_ok && self.id.as_ref().is_some_and(truthy)
    }

    /// The id to echo back: the request id when truthy, else `null`
    pub fn echo_id(&self) -> Value {
        echo_id(self.id.as_ref())
    }
}

/// Echo a request id, collapsing falsy ids to `null`
pub fn echo_id(id: Option<&Value>) -> Value {
    match id {
        Some(value) if truthy(value) => value.clone(),
        _ => Value::Null,
    }
}

/// Parameters of a message request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageParams {
    /// A single inbound message
    #[serde(default)]
    pub message: Option<Message>,

    /// A list of inbound messages, used when `message` is absent
    #[serde(default)]
    pub messages: Option<Value>,

    #[serde(default)]
    pub context_id: Option<String>,

    #[serde(default)]
    pub task_id: Option<String>,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl MessageParams {
    /// Decode params; absent or `null` params decode to the defaults
    pub fn from_value(params: Option<Value>) -> Result<Self, A2AError> {
        match params {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// The inbound messages: the single `message` when present, else every
    /// entry of `messages` when it is an array, else nothing
    pub fn into_messages(self) -> Result<Vec<Message>, A2AError> {
        if let Some(message) = self.message {
            return Ok(vec![message]);
        }

        match self.messages {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(A2AError::from))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}

/// JSON-RPC 2.0 response envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    pub id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Task>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// A successful response carrying a task
    pub fn success(id: Value, task: Task) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(task),
            error: None,
        }
    }

    /// An error response
    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Build the error response for an adapter error.
    ///
    /// Internal errors hide the request id and report a generic message
    /// with the fault description under `data.details`.
    pub fn from_error(error: &A2AError, request_id: Option<&Value>) -> Self {
        if error.is_internal() {
            let body = JsonRpcError::new(error.code(), "Internal error")
                .with_data(json!({ "details": error.to_string() }));
            return Self::failure(Value::Null, body);
        }

        Self::failure(
            echo_id(request_id),
            JsonRpcError::new(error.code(), error.to_string()),
        )
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
