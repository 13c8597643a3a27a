//! Core A2A protocol types and definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub mod message;
pub mod task;

pub use error::A2AError;
pub use message::{Message, MessagePart, Role};
pub use task::{Task, TaskState, TaskStatus};

/// Artifacts represent task outputs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Unique identifier of the Artifact
    pub artifact_id: String,

    /// A human readable name for the Artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A human readable description of the Artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Contents of the Artifact
    pub parts: Vec<MessagePart>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Artifact {
    /// Create a named artifact
    pub fn new(artifact_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            name: Some(name.into()),
            description: None,
            parts: Vec::new(),
            metadata: None,
        }
    }

    /// Add a part
    pub fn with_part(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }
}
