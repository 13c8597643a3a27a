//! Server-Sent Events (SSE) codec for streaming model responses
//!
//! OpenAI-compatible chat endpoints stream completions as SSE `data:` lines,
//! each holding one JSON chunk, terminated by a literal `[DONE]`.

use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::transport::TransportError;

/// Marker sent as the data of the final event
pub const DONE_MARKER: &str = "[DONE]";

/// A single SSE event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Event name (`"message"` when the server does not set one)
    pub event: String,

    /// Raw event data
    pub data: String,
}

impl SseEvent {
    /// Check if this event terminates the stream
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_MARKER
    }
}

/// SSE codec for parsing streaming responses
#[derive(Debug, Clone, Default)]
pub struct SseCodec;

impl SseCodec {
    /// Create a new SSE codec
    pub fn new() -> Self {
        Self
    }

    /// Parse an SSE byte stream into a stream of events
    ///
    /// Events after the `[DONE]` marker are not yielded.
    pub fn parse_stream<S>(
        &self,
        byte_stream: S,
    ) -> impl Stream<Item = Result<SseEvent, TransportError>> + Send
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        byte_stream
            .eventsource()
            .map(|result| match result {
                Ok(event) => Ok(SseEvent {
                    event: event.event,
                    data: event.data,
                }),
                Err(e) => Err(TransportError::Stream(format!("SSE stream error: {}", e))),
            })
            .take_while(|result| {
                let done = matches!(result, Ok(event) if event.is_done());
                futures::future::ready(!done)
            })
    }
}
