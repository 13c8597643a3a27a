//! Core A2A adapter service
//!
//! Resolves the addressed agent, flattens the inbound messages, runs the
//! agent and repackages its answer as a completed task.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    agent::{AgentRegistry, GenerateOptions, GenerateOutput},
    codec::MessageParams,
    model::{ChatMessage, ChatRole},
    protocol::{
        error::A2AError,
        message::{Message, MessagePart, Role},
        task::{Task, TaskStatus},
        Artifact,
    },
    service::{A2aRequest, A2aResponse},
};

/// Adapter between JSON-RPC envelopes and registered agents
///
/// Expects envelopes that already passed validation; see
/// [`crate::layer::EnvelopeValidationLayer`].
#[derive(Debug, Clone)]
pub struct A2aAdapterService {
    registry: Arc<AgentRegistry>,
}

impl A2aAdapterService {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    async fn handle(registry: Arc<AgentRegistry>, req: A2aRequest) -> Result<A2aResponse, A2AError> {
        let agent = registry.get(&req.agent_id).ok_or_else(|| A2AError::AgentNotFound {
            agent_id: req.agent_id.clone(),
        })?;

        let request_id = req.envelope.echo_id();
        let params = MessageParams::from_value(req.envelope.params)?;
        let context_id = params.context_id.clone();
        let task_id = params.task_id.clone();
        let inbound = params.into_messages()?;

        info!(agent = %req.agent_id, messages = inbound.len(), "invoking agent");

        let mut options = GenerateOptions::default();
        if let Some(context_id) = &context_id {
            options = options.with_thread_id(context_id.clone());
        }
        let output = agent.generate(normalize_messages(&inbound), options).await?;

        let text = select_agent_text(&output);
        let task = build_task(
            &req.agent_id,
            task_id.unwrap_or_else(new_id),
            context_id.unwrap_or_else(new_id),
            inbound,
            &text,
            &output,
        )?;

        Ok(A2aResponse::new(request_id, task))
    }
}

impl Service<A2aRequest> for A2aAdapterService {
    type Response = A2aResponse;
    type Error = A2AError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: A2aRequest) -> Self::Future {
        let registry = self.registry.clone();
        Box::pin(async move {
            let agent_id = req.agent_id.clone();
            Self::handle(registry, req).await.inspect_err(|e| {
                if e.is_internal() {
                    warn!(agent = %agent_id, error = %e, "agent invocation failed");
                }
            })
        })
    }
}

fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Flatten inbound messages into role/content chat messages
pub fn normalize_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => ChatRole::User,
                Role::Agent => ChatRole::Assistant,
            };
            ChatMessage::new(role, message.flatten_text())
        })
        .collect()
}

/// The text to report for a run.
///
/// Takes the first non-empty of the final text, the output text, the
/// plain text and the last message's content, else the empty string.
pub fn select_agent_text(output: &GenerateOutput) -> String {
    [
        output.final_text.as_deref(),
        output.output_text.as_deref(),
        output.text.as_deref(),
        output.messages.last().map(|m| m.content.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|text| !text.is_empty())
    .unwrap_or_default()
    .to_string()
}

fn build_task(
    agent_id: &str,
    task_id: String,
    context_id: String,
    inbound: Vec<Message>,
    text: &str,
    output: &GenerateOutput,
) -> Result<Task, A2AError> {
    let mut artifact = Artifact::new(new_id(), format!("{agent_id}Response")).with_part(MessagePart::text(text));
    for result in &output.tool_results {
        artifact = artifact.with_part(MessagePart::data(serde_json::to_value(result)?));
    }

    let mut history: Vec<Message> = inbound
        .into_iter()
        .map(|message| Message {
            message_id: Some(message.message_id.unwrap_or_else(new_id)),
            task_id: Some(message.task_id.unwrap_or_else(|| task_id.clone())),
            context_id: None,
            metadata: None,
            ..message
        })
        .collect();
    history.push(
        Message::agent(text)
            .with_message_id(new_id())
            .with_task_id(task_id.clone()),
    );

    let status = TaskStatus::completed(Message::agent(text).with_message_id(new_id()));

    Ok(Task::new(task_id, context_id)
        .with_status(status)
        .with_artifact(artifact)
        .with_history(history))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn output(final_text: Option<&str>, output_text: Option<&str>, text: Option<&str>, last: Option<&str>) -> GenerateOutput {
        GenerateOutput {
            final_text: final_text.map(str::to_string),
            output_text: output_text.map(str::to_string),
            text: text.map(str::to_string),
            tool_results: vec![],
            messages: last.map(ChatMessage::assistant).into_iter().collect(),
        }
    }

    #[test]
    fn test_agent_text_prefers_final_text() {
        let out = output(Some("final"), Some("output"), Some("text"), Some("last"));
        assert_eq!(select_agent_text(&out), "final");
    }

    #[test]
    fn test_agent_text_falls_back_to_output_text() {
        let out = output(Some(""), Some("output"), Some("text"), Some("last"));
        assert_eq!(select_agent_text(&out), "output");
    }

    #[test]
    fn test_agent_text_falls_back_to_text() {
        let out = output(None, Some(""), Some("text"), Some("last"));
        assert_eq!(select_agent_text(&out), "text");
    }

    #[test]
    fn test_agent_text_falls_back_to_last_message() {
        let out = output(None, None, Some(""), Some("last"));
        assert_eq!(select_agent_text(&out), "last");
    }

    #[test]
    fn test_agent_text_defaults_to_empty() {
        assert_eq!(select_agent_text(&output(None, None, None, None)), "");
        assert_eq!(select_agent_text(&output(Some(""), Some(""), Some(""), Some(""))), "");
    }

    #[test]
    fn test_normalize_messages() {
        let messages = vec![
            Message::user("line one")
                .with_part(MessagePart::data(json!({"k": [1, 2]})))
                .with_part(MessagePart::file("a.pdf", "https://example.com/a.pdf")),
            Message::agent("earlier answer"),
        ];

        let normalized = normalize_messages(&messages);

        assert_eq!(normalized[0], ChatMessage::user("line one\n{\"k\":[1,2]}\n"));
        assert_eq!(normalized[1], ChatMessage::assistant("earlier answer"));
    }

    #[test]
    fn test_build_task_shape() {
        let out = GenerateOutput {
            tool_results: vec![crate::agent::ToolResult {
                tool_call_id: "c1".into(),
                tool_name: "mailboxlayerTool".into(),
                args: json!({"email": "a@b.com"}),
                result: json!({"format_valid": true}),
            }],
            ..GenerateOutput::from_text("ok")
        };
        let inbound = vec![
            Message::user("hi").with_message_id("m-1"),
            Message::user("again").with_task_id("t-own").with_context_id("ctx-own"),
        ];

        let task = build_task("mail-verifier-agent", "t-1".into(), "ctx-1".into(), inbound, "ok", &out).unwrap();
        let wire = serde_json::to_value(&task).unwrap();

        assert_eq!(wire["id"], "t-1");
        assert_eq!(wire["contextId"], "ctx-1");
        assert_eq!(wire["kind"], "task");
        assert_eq!(wire["status"]["state"], "completed");
        assert_eq!(wire["status"]["message"]["role"], "agent");
        assert_eq!(wire["status"]["message"]["kind"], "message");

        let artifact = &wire["artifacts"][0];
        assert_eq!(artifact["name"], "mail-verifier-agentResponse");
        assert_eq!(artifact["parts"][0], json!({"kind": "text", "text": "ok"}));
        assert_eq!(artifact["parts"][1]["kind"], "data");
        assert_eq!(artifact["parts"][1]["data"]["toolName"], "mailboxlayerTool");

        let history = wire["history"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0]["messageId"], "m-1");
        assert_eq!(history[0]["taskId"], "t-1");
        assert_eq!(history[1]["taskId"], "t-own");
        assert!(history[1].get("contextId").is_none());
        assert!(history[1]["messageId"].is_string());
        assert_eq!(history[2]["role"], "agent");
        assert_eq!(history[2]["taskId"], "t-1");
        assert_eq!(history[2]["parts"], json!([{"kind": "text", "text": "ok"}]));
    }
}
