//! Scorers for the mail verifier agent

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::model::LanguageModel;

use super::{
    code::{CompletenessScorer, ToolCallAppropriatenessScorer},
    confidence_score,
    judge::{Exchange, JudgePipeline, JudgedScorer},
    Sampling, ScorerBinding, ScorerError, ScorerRun,
};

pub const EXPLANATION_JUDGE_MODEL: &str = "google/gemini-2.5-pro";

const JUDGE_INSTRUCTIONS: &str = "\
You are an expert evaluator of email verification explanations.
Given the user's request and the assistant's response, determine if the explanation
correctly reflects the email verification results.

Focus on:
- Whether the assistant correctly identifies if the email is valid or invalid.
- Whether it correctly notes if the email is disposable or from a free provider.
- Whether the assistant avoids contradictions or hallucinations.

Return JSON strictly matching the provided schema.";

fn full_confidence() -> f64 {
    1.0
}

/// Judge verdict on a verification explanation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplanationAnalysis {
    pub accurate: bool,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub explanation: String,
}

/// Does the assistant report the verification findings faithfully?
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplanationAccuracy;

impl JudgePipeline for ExplanationAccuracy {
    type Preprocessed = Exchange;
    type Analysis = ExplanationAnalysis;

    fn preprocess(&self, run: &ScorerRun) -> Exchange {
        Exchange::from_run(run)
    }

    fn create_prompt(&self, exchange: &Exchange) -> String {
        format!(
            r#"You are evaluating the accuracy of an email verification explanation.
User text:
"""
{user}
"""
Assistant response:
"""
{assistant}
"""

Tasks:
1. Check if the assistant correctly reports whether the email is valid, deliverable, or disposable.
2. Verify that it does not include contradictory or fabricated information.
3. Be forgiving about stylistic differences; focus on factual accuracy.

Return JSON with fields:
{{
  "accurate": boolean,
  "confidence": number, // 0-1
  "explanation": string
}}"#,
            user = exchange.user_text,
            assistant = exchange.assistant_text,
        )
    }

    fn check(&self, analysis: &ExplanationAnalysis) -> Result<(), ScorerError> {
        if !(0.0..=1.0).contains(&analysis.confidence) {
            return Err(ScorerError::InvalidAnalysis(format!(
                "confidence {} outside [0, 1]",
                analysis.confidence
            )));
        }
        Ok(())
    }

    fn generate_score(&self, analysis: &ExplanationAnalysis) -> f64 {
        if analysis.accurate {
            confidence_score(analysis.confidence)
        } else {
            0.0
        }
    }

    fn generate_reason(&self, analysis: &ExplanationAnalysis, score: f64) -> String {
        format!(
            "Explanation scoring: accurate={}, confidence={}. Score={}. {}",
            analysis.accurate, analysis.confidence, score, analysis.explanation
        )
    }
}

pub fn explanation_accuracy_scorer(judge: Arc<dyn LanguageModel>) -> JudgedScorer<ExplanationAccuracy> {
    JudgedScorer::new(
        "Explanation Accuracy",
        "Evaluates whether the assistant accurately explains email verification results (validity, disposability, deliverability, and syntax correctness).",
        JUDGE_INSTRUCTIONS,
        judge,
        ExplanationAccuracy,
    )
}

/// The mail verifier scorer set, keyed by registration name
pub fn mail_scorers(judge: Arc<dyn LanguageModel>) -> BTreeMap<String, ScorerBinding> {
    let sampling = Sampling::ratio(1.0);
    BTreeMap::from([
        (
            "mailtoolCallAppropriatenessScorer".to_string(),
            ScorerBinding::new(
                Arc::new(ToolCallAppropriatenessScorer::new("mailboxlayerTool", false)),
                sampling,
            ),
        ),
        (
            "mailcompletenessScorer".to_string(),
            ScorerBinding::new(Arc::new(CompletenessScorer::new()), sampling),
        ),
        (
            "mailexplanationAccuracyScorer".to_string(),
            ScorerBinding::new(Arc::new(explanation_accuracy_scorer(judge)), sampling),
        ),
    ])
}
