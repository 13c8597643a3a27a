//! OpenAI-compatible chat completions client
//!
//! Both OpenAI and Gemini (through its OpenAI compatibility endpoint) are
//! served by this client; only the base URL and credentials differ.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    codec::SseCodec,
    transport::{AuthCredentials, HttpTransport, Transport, TransportRequest},
};

use super::{
    ChatMessage, ChatRole, LanguageModel, ModelError, ModelRequest, ModelResponse,
    ResponseFormat, TextStream, ToolCall, Usage,
};

const CHAT_COMPLETIONS: &str = "chat/completions";

/// Chat model served by an OpenAI-compatible endpoint
#[derive(Clone, Debug)]
pub struct OpenAiCompatibleModel<T = HttpTransport> {
    transport: T,
    model_id: String,
    model_name: String,
    auth: Option<AuthCredentials>,
    key_env_var: String,
}

impl<T: Transport> OpenAiCompatibleModel<T> {
    /// Create a client for `model_id` (`provider/model`), sending `model_name` upstream
    pub fn new(
        transport: T,
        model_id: impl Into<String>,
        model_name: impl Into<String>,
        auth: Option<AuthCredentials>,
        key_env_var: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            model_id: model_id.into(),
            model_name: model_name.into(),
            auth,
            key_env_var: key_env_var.into(),
        }
    }

    fn build_request(&self, request: &ModelRequest, stream: bool) -> Result<TransportRequest, ModelError> {
        let auth = self.auth.as_ref().ok_or_else(|| ModelError::MissingApiKey {
            provider: self.provider().to_string(),
            env_var: self.key_env_var.clone(),
        })?;

        let body = WireRequest {
            model: &self.model_name,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            tools: request.tools.iter().map(WireTool::from).collect(),
            stream,
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(WireResponseFormat {
                    kind: "json_object",
                }),
            },
            temperature: request.temperature,
        };

        let transport_req = TransportRequest::post(CHAT_COMPLETIONS)
            .header("Content-Type", "application/json")
            .body(Bytes::from(serde_json::to_vec(&body)?));

        Ok(auth.apply(transport_req))
    }

    fn provider(&self) -> &str {
        self.model_id.split('/').next().unwrap_or_default()
    }
}

#[async_trait]
impl<T: Transport> LanguageModel for OpenAiCompatibleModel<T> {
    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let transport_req = self.build_request(&request, false)?;
        debug!(model = %self.model_id, messages = request.messages.len(), tools = request.tools.len(), "model request");

        let response = self.transport.execute(transport_req).await?;
        if !response.is_success() {
            return Err(api_error(response.status, &response.body));
        }

        let body: WireResponse = serde_json::from_slice(&response.body)?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();

        Ok(ModelResponse {
            text: choice.message.content,
            tool_calls,
            finish_reason: choice.finish_reason,
            usage: body.usage,
        })
    }

    async fn stream(&self, request: ModelRequest) -> Result<TextStream, ModelError> {
        let transport_req = self.build_request(&request, true)?;
        debug!(model = %self.model_id, messages = request.messages.len(), "model streaming request");

        let bytes = self.transport.execute_streaming(transport_req).await?;
        let deltas = SseCodec::new().parse_stream(bytes).filter_map(|event| async move {
            match event {
                Ok(event) => match serde_json::from_str::<WireStreamChunk>(&event.data) {
                    Ok(chunk) => chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|text| !text.is_empty())
                        .map(Ok),
                    Err(e) => {
                        warn!(error = %e, "skipping malformed stream chunk");
                        None
                    }
                },
                Err(e) => Some(Err(ModelError::from(e))),
            }
        });

        Ok(Box::pin(deltas))
    }
}

fn api_error(status: u16, body: &[u8]) -> ModelError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string());

    ModelError::Api { status, message }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = (!message.tool_calls.is_empty())
            .then(|| message.tool_calls.iter().map(WireToolCall::from).collect());

        Self {
            role: message.role,
            content: Some(message.content.clone()),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

impl From<&super::ToolDefinition> for WireTool {
    fn from(tool: &super::ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireToolFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Serialize, Deserialize)]
struct WireToolFunction {
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireToolFunction {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));
        Self {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireStreamChunk {
    #[serde(default)]
    choices: Vec<WireStreamChoice>,
}

#[derive(Deserialize)]
struct WireStreamChoice {
    delta: WireDelta,
}

#[derive(Deserialize)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        model::ToolDefinition,
        transport::{mock::MockTransport, TransportResponse},
    };

    fn model(transport: MockTransport) -> OpenAiCompatibleModel<MockTransport> {
        OpenAiCompatibleModel::new(
            transport,
            "openai/gpt-4o-mini",
            "gpt-4o-mini",
            Some(AuthCredentials::bearer("sk-test")),
            "OPENAI_API_KEY",
        )
    }

    #[tokio::test]
    async fn test_generate_text() {
        let transport = MockTransport::json(
            200,
            json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
            }),
        );
        let model = model(transport.clone());

        let response = model
            .generate(ModelRequest::new(vec![ChatMessage::user("Hi")]))
            .await
            .unwrap();

        assert_eq!(response.text.as_deref(), Some("Hello"));
        assert_eq!(response.usage.unwrap().total_tokens, 4);

        let sent = &transport.requests()[0];
        assert_eq!(sent.endpoint, "chat/completions");
        assert_eq!(sent.headers.get("Authorization").unwrap(), "Bearer sk-test");
        let body: Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], false);
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_generate_tool_calls() {
        let transport = MockTransport::json(
            200,
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "mailboxlayerTool", "arguments": "{\"email\":\"a@b.com\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }),
        );
        let model = model(transport.clone());

        let request = ModelRequest::new(vec![ChatMessage::user("verify a@b.com")]).with_tools(vec![
            ToolDefinition {
                name: "mailboxlayerTool".into(),
                description: "verify".into(),
                parameters: json!({"type": "object"}),
            },
        ]);
        let response = model.generate(request).await.unwrap();

        assert!(response.text.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].arguments, json!({"email": "a@b.com"}));

        let body: Value = serde_json::from_slice(&transport.requests()[0].body).unwrap();
        assert_eq!(body["tools"][0]["function"]["name"], "mailboxlayerTool");
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let transport = MockTransport::json(401, json!({"error": {"message": "bad key"}}));

        let err = model(transport)
            .generate(ModelRequest::new(vec![ChatMessage::user("Hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Api { status: 401, ref message } if message == "bad key"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let model = OpenAiCompatibleModel::new(
            MockTransport::json(200, json!({})),
            "google/gemini-2.5-flash",
            "gemini-2.5-flash",
            None,
            "GOOGLE_GENERATIVE_AI_API_KEY",
        );

        let err = model
            .generate(ModelRequest::new(vec![ChatMessage::user("Hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::MissingApiKey { ref provider, .. } if provider == "google"));
    }

    #[tokio::test]
    async fn test_stream_text_deltas() {
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n"
        );
        let transport = MockTransport::new(move |_| TransportResponse::new(200).body(sse));

        let chunks: Vec<String> = model(transport)
            .stream(ModelRequest::new(vec![ChatMessage::user("Hi")]))
            .await
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(chunks, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[test]
    fn test_tool_message_wire_shape() {
        let wire = WireMessage::from(&ChatMessage::tool("call_1", "{\"ok\":true}"));
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
    }
}
