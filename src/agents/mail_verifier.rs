//! Email verification assistant

use std::sync::Arc;

use crate::{
    agent::Agent,
    model::LanguageModel,
    scorer::mail::mail_scorers,
    tools::{MailboxLayerClient, MailboxLayerTool, ToolSet},
    transport::Transport,
};

use super::MAIL_VERIFIER_AGENT_ID;

pub const MAIL_VERIFIER_AGENT_NAME: &str = "mailverifier Agent";
pub const MAIL_VERIFIER_AGENT_MODEL: &str = "google/gemini-2.5-flash";

pub const MAIL_VERIFIER_INSTRUCTIONS: &str = "\
You are an intelligent Email Verification Agent.
Your job is to check if an email address is valid, disposable, free, and safe to use for communication.
Use the mailboxlayerTool to perform your checks.
Return clear and concise verification results.";

/// The mail verifier agent with the MailboxLayer tool and mail scorers attached
pub fn mail_verifier_agent<T: Transport>(
    model: Arc<dyn LanguageModel>,
    judge: Arc<dyn LanguageModel>,
    client: MailboxLayerClient<T>,
) -> Agent {
    Agent::new(
        MAIL_VERIFIER_AGENT_ID,
        MAIL_VERIFIER_AGENT_NAME,
        MAIL_VERIFIER_INSTRUCTIONS,
        model,
    )
    .with_tools(ToolSet::new().with_tool("mailboxlayerTool", Arc::new(MailboxLayerTool::new(client))))
    .with_scorers(mail_scorers(judge))
}
