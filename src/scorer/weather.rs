//! Scorers for the weather agent

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::model::LanguageModel;

use super::{
    code::{CompletenessScorer, ToolCallAppropriatenessScorer},
    confidence_score,
    judge::{Exchange, JudgePipeline, JudgedScorer},
    Sampling, ScorerBinding, ScorerError, ScorerRun,
};

pub const TRANSLATION_JUDGE_MODEL: &str = "openai/gpt-4o-mini";

const JUDGE_INSTRUCTIONS: &str = "\
You are an expert evaluator of translation quality for geographic locations.
Determine whether the user text mentions a non-English location and whether the assistant correctly uses an English translation of that location.
Be lenient with transliteration differences and diacritics.
Return only the structured JSON matching the provided schema.";

fn full_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslationAnalysis {
    pub non_english: bool,
    pub translated: bool,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub explanation: String,
}

/// Are non-English locations translated to English in the answer?
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationQuality;

impl JudgePipeline for TranslationQuality {
    type Preprocessed = Exchange;
    type Analysis = TranslationAnalysis;

    fn preprocess(&self, run: &ScorerRun) -> Exchange {
        Exchange::from_run(run)
    }

    fn create_prompt(&self, exchange: &Exchange) -> String {
        format!(
            r#"You are evaluating if a weather assistant correctly handled translation of a non-English location.
User text:
"""
{user}
"""
Assistant response:
"""
{assistant}
"""
Tasks:
1) Identify if the user mentioned a location that appears non-English.
2) If non-English, check whether the assistant used a correct English translation of that location in its response.
3) Be lenient with transliteration differences (e.g., accents/diacritics).
Return JSON with fields:
{{
"nonEnglish": boolean,
"translated": boolean,
"confidence": number, // 0-1
"explanation": string
}}"#,
            user = exchange.user_text,
            assistant = exchange.assistant_text,
        )
    }

    fn check(&self, analysis: &TranslationAnalysis) -> Result<(), ScorerError> {
        if !(0.0..=1.0).contains(&analysis.confidence) {
            return Err(ScorerError::InvalidAnalysis(format!(
                "confidence {} outside [0, 1]",
                analysis.confidence
            )));
        }
        Ok(())
    }

    fn generate_score(&self, analysis: &TranslationAnalysis) -> f64 {
        if !analysis.non_english {
            1.0
        } else if analysis.translated {
            confidence_score(analysis.confidence)
        } else {
            0.0
        }
    }

    fn generate_reason(&self, analysis: &TranslationAnalysis, score: f64) -> String {
        format!(
            "Translation scoring: nonEnglish={}, translated={}, confidence={}. Score={}. {}",
            analysis.non_english, analysis.translated, analysis.confidence, score, analysis.explanation
        )
    }
}

pub fn translation_scorer(judge: Arc<dyn LanguageModel>) -> JudgedScorer<TranslationQuality> {
    JudgedScorer::new(
        "Translation Quality",
        "Checks that non-English location names are translated and used correctly",
        JUDGE_INSTRUCTIONS,
        judge,
        TranslationQuality,
    )
}

/// The weather scorer set, keyed by registration name
pub fn weather_scorers(judge: Arc<dyn LanguageModel>) -> BTreeMap<String, ScorerBinding> {
    let sampling = Sampling::ratio(1.0);
    BTreeMap::from([
        (
            "toolCallAppropriatenessScorer".to_string(),
            ScorerBinding::new(
                Arc::new(ToolCallAppropriatenessScorer::new("weatherTool", false)),
                sampling,
            ),
        ),
        (
            "completenessScorer".to_string(),
            ScorerBinding::new(Arc::new(CompletenessScorer::new()), sampling),
        ),
        (
            "translationScorer".to_string(),
            ScorerBinding::new(Arc::new(translation_scorer(judge)), sampling),
        ),
    ])
}
