//! Result of an agent generation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ChatMessage, ChatRole};

/// One executed tool call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_call_id: String,
    pub tool_name: String,
    pub args: Value,
    pub result: Value,
}

/// Everything an agent produced for one `generate` call
///
/// The text fields mirror the ways a caller may ask for "the answer":
/// `final_text` is the last step's text when the run ended on its own,
/// `output_text` joins every non-empty step text and `text` is the last
/// step's text regardless of how the run ended.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub final_text: Option<String>,
    pub output_text: Option<String>,
    pub text: Option<String>,
    pub tool_results: Vec<ToolResult>,
    /// Messages produced during the run, tool results included
    pub messages: Vec<ChatMessage>,
}

impl GenerateOutput {
    /// Output consisting of a single assistant answer
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            final_text: Some(text.clone()),
            output_text: Some(text.clone()),
            text: Some(text.clone()),
            tool_results: Vec::new(),
            messages: vec![ChatMessage::assistant(text)],
        }
    }

    /// Assistant messages that carry text
    pub fn assistant_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::Assistant && !m.content.is_empty())
    }
}
