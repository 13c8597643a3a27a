//! Evaluation scorers attached to agents
//!
//! A scorer looks at a finished agent run and produces a score in `[0, 1]`
//! with an optional reason. Code scorers compute the score directly; judged
//! scorers ask a language model for a structured analysis first.

pub mod code;
pub mod judge;
pub mod mail;
pub mod weather;

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{agent::ToolResult, model::ChatMessage, model::ModelError};

pub use code::{CompletenessScorer, ToolCallAppropriatenessScorer};
pub use judge::{JudgePipeline, JudgedScorer};

/// Errors raised while scoring a run
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The judge answer did not match the expected schema
    #[error("Invalid judge analysis: {0}")]
    InvalidAnalysis(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input side of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScorerInput {
    pub input_messages: Vec<ChatMessage>,
}

/// A finished agent run as seen by scorers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScorerRun {
    pub run_id: String,
    pub agent_id: String,
    pub input: ScorerInput,
    /// Assistant messages that carry text
    pub output: Vec<ChatMessage>,
    pub tool_results: Vec<ToolResult>,
}

impl ScorerRun {
    /// Content of the first input message, empty when absent
    pub fn user_text(&self) -> &str {
        self.input
            .input_messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Content of the first output message, empty when absent
    pub fn assistant_text(&self) -> &str {
        self.output.first().map(|m| m.content.as_str()).unwrap_or_default()
    }
}

/// Result of one scorer on one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub reason: Option<String>,
    /// Raw judge analysis, for judged scorers
    pub analysis: Option<Value>,
}

impl ScoreResult {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            reason: None,
            analysis: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_analysis(mut self, analysis: Value) -> Self {
        self.analysis = Some(analysis);
        self
    }
}

/// An evaluation over finished runs
#[async_trait]
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, run: &ScorerRun) -> Result<ScoreResult, ScorerError>;
}

/// How often an attached scorer runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Sampling {
    None,
    Ratio { rate: f64 },
}

impl Sampling {
    pub fn ratio(rate: f64) -> Self {
        Self::Ratio { rate }
    }

    /// Decide whether the current run is sampled
    pub fn should_sample<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match *self {
            Self::None => false,
            Self::Ratio { rate } if rate >= 1.0 => true,
            Self::Ratio { rate } if rate <= 0.0 => false,
            Self::Ratio { rate } => rng.gen_bool(rate),
        }
    }
}

impl Default for Sampling {
    fn default() -> Self {
        Self::ratio(1.0)
    }
}

/// A scorer attached to an agent with its sampling policy
#[derive(Clone)]
pub struct ScorerBinding {
    pub scorer: Arc<dyn Scorer>,
    pub sampling: Sampling,
}

impl ScorerBinding {
    pub fn new(scorer: Arc<dyn Scorer>, sampling: Sampling) -> Self {
        Self { scorer, sampling }
    }
}

impl std::fmt::Debug for ScorerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerBinding")
            .field("scorer", &self.scorer.name())
            .field("sampling", &self.sampling)
            .finish()
    }
}

/// `0.7 + 0.3 * confidence`, clamped to `[0, 1]`
pub(crate) fn confidence_score(confidence: f64) -> f64 {
    (0.7 + 0.3 * confidence).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sampling_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!Sampling::None.should_sample(&mut rng));
        assert!(Sampling::ratio(1.0).should_sample(&mut rng));
        assert!(!Sampling::ratio(0.0).should_sample(&mut rng));

        let hits = (0..1000)
            .filter(|_| Sampling::ratio(0.5).should_sample(&mut rng))
            .count();
        assert!((300..700).contains(&hits));
    }

    #[test]
    fn test_sampling_serde() {
        let json = serde_json::to_value(Sampling::ratio(1.0)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ratio", "rate": 1.0}));
        let none: Sampling = serde_json::from_value(serde_json::json!({"type": "none"})).unwrap();
        assert_eq!(none, Sampling::None);
    }

    #[test]
    fn test_confidence_score() {
        assert_eq!(confidence_score(1.0), 1.0);
        assert!((confidence_score(0.5) - 0.85).abs() < 1e-9);
        assert_eq!(confidence_score(5.0), 1.0);
    }

    #[test]
    fn test_run_texts_default_to_empty() {
        let run = ScorerRun {
            run_id: "r".into(),
            agent_id: "a".into(),
            input: ScorerInput::default(),
            output: vec![],
            tool_results: vec![],
        };
        assert_eq!(run.user_text(), "");
        assert_eq!(run.assistant_text(), "");
    }
}
