//! Outbound adapter response

use serde_json::Value;

use crate::{codec::JsonRpcResponse, protocol::task::Task};

/// A completed exchange, ready to be wrapped in a JSON-RPC envelope
#[derive(Debug, Clone, PartialEq)]
pub struct A2aResponse {
    /// The request id to echo
    pub id: Value,

    /// The completed task
    pub task: Task,
}

impl A2aResponse {
    pub fn new(id: Value, task: Task) -> Self {
        Self { id, task }
    }

    /// The success envelope for this response
    pub fn into_envelope(self) -> JsonRpcResponse {
        JsonRpcResponse::success(self.id, self.task)
    }
}
