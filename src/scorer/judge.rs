//! LLM-judged scorers
//!
//! A [`JudgePipeline`] describes the four stages of a judged evaluation:
//! preprocess the run, prompt the judge, turn its analysis into a score and
//! explain the score. [`JudgedScorer`] drives the stages against a model.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    codec::json::extract_json_object,
    model::{ChatMessage, LanguageModel, ModelRequest, ResponseFormat},
};

use super::{ScoreResult, Scorer, ScorerError, ScorerRun};

/// Stages of a judged evaluation
pub trait JudgePipeline: Send + Sync {
    type Preprocessed: Serialize + Send + Sync;
    type Analysis: Serialize + DeserializeOwned + Send + Sync;

    fn preprocess(&self, run: &ScorerRun) -> Self::Preprocessed;

    /// The judge prompt for a preprocessed run
    fn create_prompt(&self, preprocessed: &Self::Preprocessed) -> String;

    /// Reject analyses that parse but violate the schema's bounds
    fn check(&self, _analysis: &Self::Analysis) -> Result<(), ScorerError> {
        Ok(())
    }

    fn generate_score(&self, analysis: &Self::Analysis) -> f64;

    fn generate_reason(&self, analysis: &Self::Analysis, score: f64) -> String;
}

/// User and assistant text of a run, the common judge input
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub user_text: String,
    pub assistant_text: String,
}

impl Exchange {
    pub fn from_run(run: &ScorerRun) -> Self {
        Self {
            user_text: run.user_text().to_string(),
            assistant_text: run.assistant_text().to_string(),
        }
    }
}

/// A scorer whose analysis comes from a judge model
pub struct JudgedScorer<P> {
    name: String,
    description: String,
    instructions: String,
    model: Arc<dyn LanguageModel>,
    pipeline: P,
}

impl<P: JudgePipeline> JudgedScorer<P> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: impl Into<String>,
        model: Arc<dyn LanguageModel>,
        pipeline: P,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: instructions.into(),
            model,
            pipeline,
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    async fn analyze(&self, prompt: String) -> Result<(P::Analysis, Value), ScorerError> {
        let request = ModelRequest::new(vec![
            ChatMessage::system(self.instructions.clone()),
            ChatMessage::user(prompt),
        ])
        .with_response_format(ResponseFormat::JsonObject)
        .with_temperature(0.0);

        let response = self.model.generate(request).await?;
        let text = response.text.unwrap_or_default();
        let json = extract_json_object(&text)
            .ok_or_else(|| ScorerError::InvalidAnalysis(format!("no JSON object in judge output: {text}")))?;

        let raw: Value = serde_json::from_str(json)?;
        let analysis: P::Analysis = serde_json::from_value(raw.clone())
            .map_err(|e| ScorerError::InvalidAnalysis(e.to_string()))?;
        Ok((analysis, raw))
    }
}

#[async_trait]
impl<P: JudgePipeline> Scorer for JudgedScorer<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, run: &ScorerRun) -> Result<ScoreResult, ScorerError> {
        let preprocessed = self.pipeline.preprocess(run);
        let prompt = self.pipeline.create_prompt(&preprocessed);

        let (analysis, raw) = self.analyze(prompt).await?;
        self.pipeline.check(&analysis)?;

        let score = self.pipeline.generate_score(&analysis);
        let reason = self.pipeline.generate_reason(&analysis, score);
        debug!(scorer = %self.name, run_id = %run.run_id, score, "judged run");

        Ok(ScoreResult::new(score).with_reason(reason).with_analysis(raw))
    }
}

impl<P> std::fmt::Debug for JudgedScorer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgedScorer")
            .field("name", &self.name)
            .field("model", &self.model.model_id())
            .finish()
    }
}
