//! Scorers computed without a judge model

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{ScoreResult, Scorer, ScorerError, ScorerRun};

/// Was the expected tool called?
///
/// In strict mode the expected tool must be the only tool called.
#[derive(Debug, Clone)]
pub struct ToolCallAppropriatenessScorer {
    expected_tool: String,
    strict: bool,
}

impl ToolCallAppropriatenessScorer {
    pub fn new(expected_tool: impl Into<String>, strict: bool) -> Self {
        Self {
            expected_tool: expected_tool.into(),
            strict,
        }
    }

    fn evaluate(&self, called: &[&str]) -> (f64, String) {
        let expected_called = called.iter().any(|name| *name == self.expected_tool);
        let only_expected = called.iter().all(|name| *name == self.expected_tool);

        let score = match (expected_called, self.strict) {
            (false, _) => 0.0,
            (true, false) => 1.0,
            (true, true) if only_expected => 1.0,
            (true, true) => 0.0,
        };

        let reason = if called.is_empty() {
            format!("No tools were called; expected '{}'", self.expected_tool)
        } else {
            format!(
                "Expected '{}' ({} mode); called: {}",
                self.expected_tool,
                if self.strict { "strict" } else { "lenient" },
                called.join(", ")
            )
        };
        (score, reason)
    }
}

#[async_trait]
impl Scorer for ToolCallAppropriatenessScorer {
    fn name(&self) -> &str {
        "Tool Call Appropriateness"
    }

    fn description(&self) -> &str {
        "Checks whether the agent called the expected tool"
    }

    async fn run(&self, run: &ScorerRun) -> Result<ScoreResult, ScorerError> {
        let called: Vec<&str> = run.tool_results.iter().map(|r| r.tool_name.as_str()).collect();
        let (score, reason) = self.evaluate(&called);
        Ok(ScoreResult::new(score).with_reason(reason))
    }
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from", "has",
    "have", "how", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on", "or", "please", "so",
    "that", "the", "this", "to", "was", "what", "when", "which", "who", "will", "with", "you", "your",
];

/// Distinct lowercase terms of `text`, stopwords removed
pub fn significant_terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '@' || c == '.' || c == '_' || c == '-'))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|token| !token.is_empty() && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

fn term_covered(term: &str, output: &BTreeSet<String>) -> bool {
    if output.contains(term) {
        return true;
    }
    // crude stemming: "verify" covers "verifying"
    term.len() >= 4
        && output.iter().any(|candidate| {
            candidate.len() >= 4 && (candidate.starts_with(term) || term.starts_with(candidate.as_str()))
        })
}

/// Share of the input's significant terms that the output covers
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessScorer;

impl CompletenessScorer {
    pub fn new() -> Self {
        Self
    }

    /// Coverage of `input` terms by `output`
    pub fn coverage(input: &str, output: &str) -> (f64, usize, usize) {
        let input_terms = significant_terms(input);
        let output_terms = significant_terms(output);

        match (input_terms.is_empty(), output_terms.is_empty()) {
            (true, true) => return (1.0, 0, 0),
            (true, false) | (false, true) => return (0.0, 0, input_terms.len()),
            (false, false) => {}
        }

        let covered = input_terms
            .iter()
            .filter(|term| term_covered(term, &output_terms))
            .count();
        (covered as f64 / input_terms.len() as f64, covered, input_terms.len())
    }
}

#[async_trait]
impl Scorer for CompletenessScorer {
    fn name(&self) -> &str {
        "Completeness"
    }

    fn description(&self) -> &str {
        "Measures how many of the input's key terms the response covers"
    }

    async fn run(&self, run: &ScorerRun) -> Result<ScoreResult, ScorerError> {
        let input = run
            .input
            .input_messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let output = run.output.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join(" ");

        let (score, covered, total) = Self::coverage(&input, &output);
        Ok(ScoreResult::new(score).with_reason(format!("Covered {covered} of {total} input terms")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{agent::ToolResult, model::ChatMessage, scorer::ScorerInput};

    fn run_with_tools(tools: &[&str]) -> ScorerRun {
        ScorerRun {
            run_id: "r".into(),
            agent_id: "a".into(),
            input: ScorerInput::default(),
            output: vec![],
            tool_results: tools
                .iter()
                .enumerate()
                .map(|(i, name)| ToolResult {
                    tool_call_id: format!("call_{i}"),
                    tool_name: name.to_string(),
                    args: json!({}),
                    result: json!({}),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_tool_call_lenient() {
        let scorer = ToolCallAppropriatenessScorer::new("mailboxlayerTool", false);

        assert_eq!(scorer.run(&run_with_tools(&["mailboxlayerTool"])).await.unwrap().score, 1.0);
        assert_eq!(
            scorer.run(&run_with_tools(&["weatherTool", "mailboxlayerTool"])).await.unwrap().score,
            1.0
        );
        assert_eq!(scorer.run(&run_with_tools(&[])).await.unwrap().score, 0.0);
    }

    #[tokio::test]
    async fn test_tool_call_strict() {
        let scorer = ToolCallAppropriatenessScorer::new("weatherTool", true);

        assert_eq!(scorer.run(&run_with_tools(&["weatherTool"])).await.unwrap().score, 1.0);
        assert_eq!(
            scorer.run(&run_with_tools(&["weatherTool", "other"])).await.unwrap().score,
            0.0
        );
    }

    #[test]
    fn test_coverage_edges() {
        assert_eq!(CompletenessScorer::coverage("", "").0, 1.0);
        assert_eq!(CompletenessScorer::coverage("the", "a").0, 1.0);
        assert_eq!(CompletenessScorer::coverage("weather Berlin", "").0, 0.0);
        assert_eq!(CompletenessScorer::coverage("", "sunny").0, 0.0);
    }

    #[tokio::test]
    async fn test_completeness_partial() {
        let run = ScorerRun {
            input: ScorerInput {
                input_messages: vec![ChatMessage::user("Verify john@example.com deliverability and disposable status")],
            },
            output: vec![ChatMessage::assistant(
                "john@example.com is deliverable and not disposable.",
            )],
            ..run_with_tools(&[])
        };

        let result = CompletenessScorer::new().run(&run).await.unwrap();
        // covers john@example.com and disposable out of five terms
        assert!((result.score - 0.4).abs() < 1e-9, "{}", result.score);
        assert_eq!(result.reason.as_deref(), Some("Covered 2 of 5 input terms"));
    }
}
