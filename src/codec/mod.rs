//! Serialization codecs for the wire formats the crate speaks

pub mod json;
pub mod jsonrpc;
pub mod sse;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MessageParams};
pub use sse::{SseCodec, SseEvent};
