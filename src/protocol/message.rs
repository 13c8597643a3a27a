//! A2A message types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::json::to_compact_string;

/// A message in the A2A protocol
///
/// Messages are the primary unit of communication between agents.
/// Each message has a role (user or agent), an ordered list of parts
/// and optional identifiers tying it to a task or conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Object discriminator, always `"message"` on the wire
    #[serde(default)]
    pub kind: MessageKind,

    /// Role of the message sender
    pub role: Role,

    /// Message content parts
    #[serde(default)]
    pub parts: Vec<MessagePart>,

    /// Optional message identifier
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Optional task identifier (for associating message with a task)
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Optional context identifier (for multi-turn conversations)
    #[serde(rename = "contextId", skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// Optional metadata for the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    /// Create a new message with text content
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Message,
            role,
            parts: vec![MessagePart::text(text)],
            message_id: None,
            task_id: None,
            context_id: None,
            metadata: None,
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an agent message with text content
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Set the message ID
    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Set the task ID
    pub fn with_task_id(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    /// Set the context ID
    pub fn with_context_id(mut self, id: impl Into<String>) -> Self {
        self.context_id = Some(id.into());
        self
    }

    /// Add a message part
    pub fn with_part(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Flatten the parts into one text body, one line per part.
    ///
    /// Text parts are taken verbatim and data parts are serialized to
    /// compact JSON. File parts carry no inline text and contribute an
    /// empty line.
    pub fn flatten_text(&self) -> String {
        self.parts
            .iter()
            .map(MessagePart::as_flat_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Wire discriminator for message objects
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Message,
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from a user
    User,

    /// Message from an AI agent
    #[serde(alias = "assistant")]
    Agent,
}

/// File content for file parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// MIME type of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Name of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// URI reference to the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Base64-encoded file content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
}

/// A part of a message, discriminated by its `kind` field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessagePart {
    /// Text content
    Text {
        /// The text content
        #[serde(default)]
        text: String,
    },

    /// Structured data
    Data {
        /// The structured data
        data: Value,
    },

    /// File reference
    File {
        /// File content
        file: FileContent,
    },

    /// Any part kind this server does not interpret
    #[serde(other)]
    Other,
}

impl MessagePart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a data part
    pub fn data(data: Value) -> Self {
        Self::Data { data }
    }

    /// Create a file part with URI reference
    pub fn file(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::File {
            file: FileContent {
                mime_type: None,
                name: Some(name.into()),
                uri: Some(uri.into()),
                bytes: None,
            },
        }
    }

    fn as_flat_text(&self) -> String {
        match self {
            MessagePart::Text { text } => text.clone(),
            MessagePart::Data { data } => to_compact_string(data),
            MessagePart::File { .. } | MessagePart::Other => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 1);

        match &msg.parts[0] {
            MessagePart::Text { text } => assert_eq!(text, "Hello, agent!"),
            _ => panic!("Expected text part"),
        }
    }

    #[test]
    fn test_parts_are_tagged_by_kind() {
        let json = serde_json::to_value(MessagePart::text("hi")).unwrap();
        assert_eq!(json, json!({"kind": "text", "text": "hi"}));

        let json = serde_json::to_value(MessagePart::data(json!({"a": 1}))).unwrap();
        assert_eq!(json, json!({"kind": "data", "data": {"a": 1}}));
    }

    #[test]
    fn test_unknown_part_kind_flattens_to_empty() {
        let part: MessagePart = serde_json::from_value(json!({"kind": "video", "url": "x"})).unwrap();
        assert_eq!(part, MessagePart::Other);

        let msg: Message = serde_json::from_value(json!({
            "role": "user",
            "parts": [
                {"kind": "text", "text": "before"},
                {"kind": "video", "url": "x"},
                {"kind": "text"}
            ]
        }))
        .unwrap();
        assert_eq!(msg.parts[2], MessagePart::text(""));
        assert_eq!(msg.flatten_text(), "before\n\n");
    }

    #[test]
    fn test_inbound_message_without_kind_or_parts() {
        let msg: Message = serde_json::from_value(json!({"role": "user"})).unwrap();
        assert_eq!(msg.kind, MessageKind::Message);
        assert!(msg.parts.is_empty());
        assert_eq!(msg.flatten_text(), "");
    }

    #[test]
    fn test_assistant_role_alias() {
        let msg: Message =
            serde_json::from_value(json!({"role": "assistant", "parts": []})).unwrap();
        assert_eq!(msg.role, Role::Agent);
    }

    #[test]
    fn test_flatten_text_joins_parts_in_order() {
        let msg = Message::user("verify")
            .with_part(MessagePart::data(json!({"email": "a@b.com"})))
            .with_part(MessagePart::text("please"));

        assert_eq!(msg.flatten_text(), "verify\n{\"email\":\"a@b.com\"}\nplease");
    }

    #[test]
    fn test_message_serialization_with_ids() {
        let msg = Message::agent("Done")
            .with_message_id("msg-123")
            .with_task_id("task-456");

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "message");
        assert_eq!(json["role"], "agent");
        assert_eq!(json["messageId"], "msg-123");
        assert_eq!(json["taskId"], "task-456");
        assert!(json.get("contextId").is_none());
    }
}
