//! Agent runtime: instructions, a model, tools, memory and scorers
//!
//! [`Agent::generate`] runs the model in a loop, executing requested tools
//! and feeding their results back until the model answers without calling
//! a tool or the step budget is spent. Attached scorers are evaluated in
//! the background once the answer is ready.

pub mod output;
pub mod registry;

use std::{collections::BTreeMap, sync::Arc};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    model::{ChatMessage, LanguageModel, ModelError, ModelRequest, TextStream, ToolCall},
    scorer::{ScorerBinding, ScorerInput, ScorerRun},
    storage::{MemoryStore, ScoreRecord, StoreError},
    tools::ToolSet,
};

pub use output::{GenerateOutput, ToolResult};
pub use registry::AgentRegistry;

/// Default bound on model calls per generation
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Default number of remembered messages replayed into a thread
pub const DEFAULT_LAST_MESSAGES: usize = 10;

/// Errors raised while running an agent
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Memory error: {0}")]
    Memory(#[from] StoreError),
}

/// Per-call generation options
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Memory thread the exchange belongs to
    pub thread_id: Option<String>,
    /// Overrides the agent's step budget
    pub max_steps: Option<usize>,
}

impl GenerateOptions {
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}

/// A configured agent
pub struct Agent {
    id: String,
    name: String,
    instructions: String,
    model: Arc<dyn LanguageModel>,
    tools: ToolSet,
    scorers: BTreeMap<String, ScorerBinding>,
    memory: Option<Arc<MemoryStore>>,
    score_store: Option<Arc<MemoryStore>>,
    max_steps: usize,
    last_messages: usize,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            instructions: instructions.into(),
            model,
            tools: ToolSet::new(),
            scorers: BTreeMap::new(),
            memory: None,
            score_store: None,
            max_steps: DEFAULT_MAX_STEPS,
            last_messages: DEFAULT_LAST_MESSAGES,
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_scorers(mut self, scorers: BTreeMap<String, ScorerBinding>) -> Self {
        self.scorers.extend(scorers);
        self
    }

    /// Conversation memory keyed by thread id
    pub fn with_memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Where scorer results are written
    pub fn with_score_store(mut self, store: Arc<MemoryStore>) -> Self {
        self.score_store = Some(store);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_last_messages(mut self, last_messages: usize) -> Self {
        self.last_messages = last_messages;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model_id(&self) -> String {
        self.model.model_id()
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn scorers(&self) -> &BTreeMap<String, ScorerBinding> {
        &self.scorers
    }

    /// Run the agent on `messages` to completion
    #[instrument(skip_all, fields(agent = %self.id))]
    pub async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> Result<GenerateOutput, AgentError> {
        let mut conversation = self.prepare(&messages, options.thread_id.as_deref()).await?;
        let max_steps = options.max_steps.unwrap_or(self.max_steps).max(1);
        let definitions = self.tools.definitions();

        let mut output = GenerateOutput::default();
        let mut step_texts = Vec::new();

        for step in 0..max_steps {
            let request = ModelRequest::new(conversation.clone()).with_tools(definitions.clone());
            let response = self.model.generate(request).await?;

            let text = response.text.unwrap_or_default();
            debug!(step, calls = response.tool_calls.len(), "model step");

            let assistant = ChatMessage::assistant(text.clone()).with_tool_calls(response.tool_calls.clone());
            conversation.push(assistant.clone());
            output.messages.push(assistant);
            step_texts.push(text.clone());

            if response.tool_calls.is_empty() {
                output.final_text = Some(text);
                break;
            }

            for call in response.tool_calls {
                let result = self.call_tool(&call).await;
                let reply = ChatMessage::tool(call.id.clone(), result.to_string());
                conversation.push(reply.clone());
                output.messages.push(reply);
                output.tool_results.push(ToolResult {
                    tool_call_id: call.id,
                    tool_name: call.name,
                    args: call.arguments,
                    result,
                });
            }
        }

        output.text = step_texts.last().cloned();
        output.output_text = Some(
            step_texts
                .iter()
                .filter(|t| !t.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
        );

        if let (Some(memory), Some(thread_id)) = (&self.memory, options.thread_id.as_deref()) {
            memory.append_messages(thread_id, &messages).await?;
            memory.append_messages(thread_id, &output.messages).await?;
        }

        info!(
            tools = output.tool_results.len(),
            finished = output.final_text.is_some(),
            "generation complete"
        );

        self.spawn_scorers(messages, &output);
        Ok(output)
    }

    /// Stream a single tool-less answer to `messages`
    #[instrument(skip_all, fields(agent = %self.id))]
    pub async fn stream(&self, messages: Vec<ChatMessage>) -> Result<TextStream, AgentError> {
        let conversation = self.prepare(&messages, None).await?;
        debug!(messages = conversation.len(), "streaming");
        Ok(self.model.stream(ModelRequest::new(conversation)).await?)
    }

    /// Evaluate every attached scorer against `run`, storing the results
    pub async fn score(&self, run: &ScorerRun) -> Vec<ScoreRecord> {
        let bindings: Vec<_> = self.scorers.iter().map(|(n, b)| (n.clone(), b.clone())).collect();
        run_scorers(bindings, run, self.score_store.as_deref()).await
    }

    async fn prepare(&self, messages: &[ChatMessage], thread_id: Option<&str>) -> Result<Vec<ChatMessage>, AgentError> {
        let mut conversation = vec![ChatMessage::system(self.instructions.clone())];
        if let (Some(memory), Some(thread_id)) = (&self.memory, thread_id) {
            conversation.extend(memory.recall(thread_id, self.last_messages).await?);
        }
        conversation.extend(messages.iter().cloned());
        Ok(conversation)
    }

    async fn call_tool(&self, call: &ToolCall) -> Value {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "model requested unknown tool");
            return json!({ "error": format!("Tool '{}' not found", call.name) });
        };

        debug!(tool = %call.name, call_id = %call.id, "executing tool");
        match tool.execute(call.arguments.clone()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                json!({ "error": e.to_string() })
            }
        }
    }

    fn spawn_scorers(&self, input: Vec<ChatMessage>, output: &GenerateOutput) {
        let sampled = self.sampled_scorers();
        if sampled.is_empty() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no runtime available, skipping scorers");
            return;
        };

        let run = ScorerRun {
            run_id: Uuid::now_v7().to_string(),
            agent_id: self.id.clone(),
            input: ScorerInput { input_messages: input },
            output: output.assistant_messages().cloned().collect(),
            tool_results: output.tool_results.clone(),
        };
        let store = self.score_store.clone();

        handle.spawn(async move {
            run_scorers(sampled, &run, store.as_deref()).await;
        });
    }

    fn sampled_scorers(&self) -> Vec<(String, ScorerBinding)> {
        let mut rng = rand::thread_rng();
        self.scorers
            .iter()
            .filter(|(_, binding)| binding.sampling.should_sample(&mut rng))
            .map(|(name, binding)| (name.clone(), binding.clone()))
            .collect()
    }
}

async fn run_scorers(
    bindings: Vec<(String, ScorerBinding)>,
    run: &ScorerRun,
    store: Option<&MemoryStore>,
) -> Vec<ScoreRecord> {
    let mut records = Vec::with_capacity(bindings.len());

    for (name, binding) in bindings {
        match binding.scorer.run(run).await {
            Ok(result) => {
                info!(
                    scorer = %name,
                    run_id = %run.run_id,
                    score = result.score,
                    reason = result.reason.as_deref().unwrap_or_default(),
                    "scored run"
                );
                let record = ScoreRecord {
                    run_id: run.run_id.clone(),
                    agent_id: run.agent_id.clone(),
                    scorer: binding.scorer.name().to_string(),
                    score: result.score,
                    reason: result.reason,
                    created_at: chrono::Utc::now(),
                };
                if let Some(store) = store {
                    if let Err(e) = store.save_score(record.clone()).await {
                        warn!(scorer = %name, error = %e, "failed to store score");
                    }
                }
                records.push(record);
            }
            Err(e) => warn!(scorer = %name, run_id = %run.run_id, error = %e, "scorer failed"),
        }
    }

    records
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model.model_id())
            .field("tools", &self.tools)
            .field("scorers", &self.scorers.keys().collect::<Vec<_>>())
            .finish()
    }
}
