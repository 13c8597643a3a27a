//! A2A task types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{message::Message, Artifact};

/// A task in the A2A protocol
///
/// A task is the result object returned for a message exchange. It carries
/// the final status, the artifacts produced by the agent and the
/// conversation history that led to them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// Context ID grouping related tasks and messages
    pub context_id: String,

    /// Current status of the task
    pub status: TaskStatus,

    /// Outputs produced by the agent
    #[serde(default)]
    pub artifacts: Vec<Artifact>,

    /// Messages exchanged for this task, oldest first
    #[serde(default)]
    pub history: Vec<Message>,

    /// Object discriminator, always `"task"` on the wire
    #[serde(default)]
    pub kind: TaskKind,
}

impl Task {
    /// Create a new submitted task
    pub fn new(id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_id: context_id.into(),
            status: TaskStatus::new(TaskState::Submitted),
            artifacts: Vec::new(),
            history: Vec::new(),
            kind: TaskKind::Task,
        }
    }

    /// Update the task status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Add an artifact
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Replace the history
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Wire discriminator for task objects
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Task,
}

/// Status of a task: its state, when it was reached and the agent message
/// that accompanies it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,

    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

impl TaskStatus {
    /// Create a status stamped with the current time
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
            message: None,
        }
    }

    /// A completed status carrying the agent's final message
    pub fn completed(message: Message) -> Self {
        Self::new(TaskState::Completed).with_message(message)
    }

    /// Attach the status message
    pub fn with_message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }
}

/// Task state in the A2A protocol lifecycle
///
/// Task lifecycle: submitted → working → completed/failed/canceled/rejected
/// Non-terminal states: input-required, auth-required (awaiting client input)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been received and is queued for processing
    Submitted,

    /// Task is currently being processed
    Working,

    /// Task requires additional input from the client
    InputRequired,

    /// Task requires authentication or authorization
    AuthRequired,

    /// Task completed successfully
    Completed,

    /// Task failed with an error
    Failed,

    /// Task was canceled by the client
    Canceled,

    /// Task was rejected by the agent
    Rejected,
}

#[cfg(test)]
mod tests {
    use crate::protocol::message::Message;

    use super::*;

    #[test]
    fn test_task_creation() {
        let task = Task::new("task-123", "ctx-1");

        assert_eq!(task.id, "task-123");
        assert_eq!(task.status.state, TaskState::Submitted);
        assert!(task.artifacts.is_empty());
    }

    #[test]
    fn test_task_serialization() {
        let task = Task::new("task-123", "ctx-1")
            .with_status(TaskStatus::completed(Message::agent("done")));

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], "task-123");
        assert_eq!(json["contextId"], "ctx-1");
        assert_eq!(json["kind"], "task");
        assert_eq!(json["status"]["state"], "completed");
        assert_eq!(json["status"]["message"]["role"], "agent");
        assert!(json["status"]["timestamp"].is_string());

        let deserialized: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task, deserialized);
    }

    #[test]
    fn test_state_uses_kebab_case() {
        let json = serde_json::to_value(TaskState::InputRequired).unwrap();
        assert_eq!(json, "input-required");
    }
}
