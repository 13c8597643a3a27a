//! Verify an address with MailboxLayer, then have the mail verifier agent
//! explain the result

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    agent::AgentRegistry,
    agents::MAIL_VERIFIER_AGENT_ID,
    model::ChatMessage,
    tools::{
        mailboxlayer::{CheckOptions, MailboxLayerClient},
        validate_email,
    },
    transport::Transport,
};

use super::{Step, Then, Traced, Workflow, WorkflowError};

pub const MAIL_VERIFIER_WORKFLOW_ID: &str = "mail-verifier-workflow";

/// Workflow input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyEmailInput {
    pub email: String,
}

/// Verification facts handed from the fetch step to the analysis step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationData {
    pub email: String,
    pub format_valid: bool,
    pub smtp_check: bool,
    pub mx_found: bool,
    pub disposable: bool,
    pub free: bool,
    pub score: f64,
    pub did_you_mean: Option<String>,
}

/// Workflow output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationSummary {
    pub summary: String,
}

/// Queries MailboxLayer with SMTP and format checks enabled
#[derive(Debug, Clone)]
pub struct FetchEmailVerification<T> {
    client: MailboxLayerClient<T>,
}

impl<T: Transport> FetchEmailVerification<T> {
    pub fn new(client: MailboxLayerClient<T>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport> Step for FetchEmailVerification<T> {
    type Input = VerifyEmailInput;
    type Output = VerificationData;

    fn id(&self) -> &str {
        "fetch-email-verification"
    }

    fn description(&self) -> &str {
        "Fetches email verification data from the MailboxLayer API"
    }

    async fn execute(&self, input: VerifyEmailInput) -> Result<VerificationData, WorkflowError> {
        validate_email(&input.email).map_err(|e| WorkflowError::InvalidInput(e.to_string()))?;

        let response = self.client.check(&input.email, CheckOptions::full()).await?;

        Ok(VerificationData {
            format_valid: response.flag("format_valid"),
            smtp_check: response.flag("smtp_check"),
            mx_found: response.flag("mx_found"),
            disposable: response.flag("disposable"),
            free: response.flag("free"),
            score: response.score().unwrap_or(0.0),
            did_you_mean: response.string("did_you_mean").filter(|s| !s.is_empty()),
            email: input.email,
        })
    }
}

/// Prompt asking the agent for a structured, human readable report
pub fn analysis_prompt(data: &VerificationData) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string_pretty(data)?;
    Ok(format!(
        r#"You are an AI Email Verification Analyst. Based on the following verification data,
provide a concise, user-friendly summary explaining the email's authenticity and deliverability.

Email verification data:
{json}

Please summarize your findings using this structure:

📧 **Email Address:** [email]

✅ **Verification Summary**
- Format Valid: [Yes/No]
- SMTP Check: [Passed/Failed]
- MX Records Found: [Yes/No]
- Disposable: [Yes/No]
- Free Provider: [Yes/No]
- Overall Confidence Score: [numeric value or rating out of 10]

💡 **Interpretation**
Explain in plain terms whether this email is likely valid, risky, or undeliverable,
and include a recommendation (e.g., "Safe to use", "Check with caution", "Invalid email").

🛠️ **Suggestions**
- If invalid: recommend corrections (e.g., did_you_mean)
- If disposable: warn about temporary address use
- If score is low: advise re-checking or alternative contact
"#
    ))
}

/// Streams the mail verifier agent's explanation of the verification data
#[derive(Debug, Clone)]
pub struct AnalyzeVerification {
    registry: Arc<AgentRegistry>,
}

impl AnalyzeVerification {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for AnalyzeVerification {
    type Input = VerificationData;
    type Output = VerificationSummary;

    fn id(&self) -> &str {
        "analyze-verification"
    }

    fn description(&self) -> &str {
        "Analyzes and explains the email verification results using the Mail Verifier Agent"
    }

    async fn execute(&self, data: VerificationData) -> Result<VerificationSummary, WorkflowError> {
        let agent = self
            .registry
            .get(MAIL_VERIFIER_AGENT_ID)
            .ok_or_else(|| WorkflowError::AgentNotFound {
                name: "Mail Verifier Agent".to_string(),
            })?;

        let prompt = analysis_prompt(&data)?;
        let mut stream = agent.stream(vec![ChatMessage::user(prompt)]).await?;

        let mut summary = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            trace!(chunk = %chunk, "summary chunk");
            summary.push_str(&chunk);
        }

        Ok(VerificationSummary { summary })
    }
}

pub type MailVerifierWorkflow<T> =
    Workflow<Then<Traced<FetchEmailVerification<T>>, Traced<AnalyzeVerification>>>;

/// `fetch-email-verification` followed by `analyze-verification`
pub fn mail_verifier_workflow<T: Transport>(
    client: MailboxLayerClient<T>,
    registry: Arc<AgentRegistry>,
) -> MailVerifierWorkflow<T> {
    Workflow::new(MAIL_VERIFIER_WORKFLOW_ID, FetchEmailVerification::new(client))
        .then(AnalyzeVerification::new(registry))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        agent::Agent,
        model::{MockLanguageModel, ModelError, TextStream},
        transport::mock::MockTransport,
    };

    fn registry_with_summary(chunks: &'static [&'static str]) -> Arc<AgentRegistry> {
        let mut model = MockLanguageModel::new();
        model
            .expect_stream()
            .withf(|req| {
                let prompt = &req.messages.last().unwrap().content;
                prompt.contains("\"smtp_check\": true") && prompt.contains("Verification Summary")
            })
            .returning(move |_| {
                let stream: TextStream = Box::pin(futures::stream::iter(chunks.iter().map(|c| Ok::<_, ModelError>(c.to_string()))));
                Ok(stream)
            });
        let agent = Agent::new(MAIL_VERIFIER_AGENT_ID, "mailverifier Agent", "Verify.", Arc::new(model));
        Arc::new(AgentRegistry::new().with_agent(agent))
    }

    fn upstream() -> MockTransport {
        MockTransport::json(
            200,
            json!({
                "email": "john@gmail.com",
                "did_you_mean": "",
                "format_valid": true,
                "mx_found": true,
                "smtp_check": true,
                "disposable": false,
                "free": true,
                "score": null
            }),
        )
    }

    #[tokio::test]
    async fn test_workflow_produces_summary() {
        let transport = upstream();
        let client = MailboxLayerClient::new(transport.clone(), Some("k".into()));
        let workflow = mail_verifier_workflow(client, registry_with_summary(&["📧 john@gmail.com ", "is valid."]));

        assert_eq!(workflow.id(), "mail-verifier-workflow");
        assert_eq!(workflow.step_ids(), ["fetch-email-verification", "analyze-verification"]);

        let output = workflow
            .run(VerifyEmailInput {
                email: "john@gmail.com".into(),
            })
            .await
            .unwrap();
        assert_eq!(output.summary, "📧 john@gmail.com is valid.");

        let sent = &transport.requests()[0];
        assert_eq!(sent.query_param("smtp"), Some("1"));
        assert_eq!(sent.query_param("format"), Some("1"));
    }

    #[tokio::test]
    async fn test_fetch_defaults_score_and_suggestion() {
        let step = FetchEmailVerification::new(MailboxLayerClient::new(upstream(), Some("k".into())));

        let data = step
            .execute(VerifyEmailInput {
                email: "john@gmail.com".into(),
            })
            .await
            .unwrap();

        assert_eq!(data.score, 0.0);
        assert_eq!(data.did_you_mean, None);
        assert!(data.free);
    }

    #[tokio::test]
    async fn test_missing_key_is_fatal() {
        let transport = upstream();
        let workflow = mail_verifier_workflow(
            MailboxLayerClient::new(transport.clone(), None),
            registry_with_summary(&[]),
        );

        let err = workflow
            .run(VerifyEmailInput {
                email: "john@gmail.com".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing MAILBOXLAYER_API_KEY environment variable");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let step = FetchEmailVerification::new(MailboxLayerClient::new(upstream(), Some("k".into())));

        let err = step
            .execute(VerifyEmailInput { email: "nope".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_agent_is_fatal() {
        let step = AnalyzeVerification::new(Arc::new(AgentRegistry::new()));

        let err = step
            .execute(VerificationData {
                email: "a@b.com".into(),
                format_valid: true,
                smtp_check: true,
                mx_found: true,
                disposable: false,
                free: false,
                score: 0.9,
                did_you_mean: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Mail Verifier Agent not found");
    }
}
