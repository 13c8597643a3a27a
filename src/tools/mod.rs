//! Tools callable by agents

pub mod mailboxlayer;
pub mod weather;

use std::{collections::BTreeMap, sync::{Arc, OnceLock}};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::model::ToolDefinition;

pub use mailboxlayer::{MailboxLayerClient, MailboxLayerTool, VerificationResult};
pub use weather::{WeatherReport, WeatherTool};

/// Errors raised by a tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// Input did not match the tool's schema
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    /// The tool ran and failed
    #[error("{0}")]
    Execution(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A capability exposed to an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool identifier
    fn id(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON schema of the tool input
    fn input_schema(&self) -> Value;

    /// Run the tool
    async fn execute(&self, input: Value) -> Result<Value, ToolError>;
}

/// Tools of one agent, keyed by the name the model calls them by
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under `name`
    pub fn with_tool(mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(name.into(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions advertised to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|(name, tool)| ToolDefinition {
                name: name.clone(),
                description: tool.description().to_string(),
                parameters: tool.input_schema(),
            })
            .collect()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-\.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern compiles")
    })
}

/// Check that `email` is a syntactically well-formed address
pub fn validate_email(email: &str) -> Result<(), ToolError> {
    if email.contains("..") || !email_pattern().is_match(email) {
        return Err(ToolError::InvalidInput(format!("Invalid email: '{}'", email)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        for ok in ["user@example.com", "first.last+tag@mail.co.uk", "a_b@x-y.io"] {
            assert!(validate_email(ok).is_ok(), "{ok}");
        }
        for bad in ["", "plain", "@example.com", "user@", "user@example", "a..b@example.com", "a b@c.com"] {
            assert!(validate_email(bad).is_err(), "{bad}");
        }
    }
}
