//! Typed, sequential workflows
//!
//! A workflow is a chain of [`Step`]s where each step's output is the next
//! step's input. Chains are built with [`Workflow::then`] and checked at
//! compile time.

pub mod mail_verifier;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, info_span, Instrument};

use crate::{agent::AgentError, model::ModelError, tools::mailboxlayer::VerifyError};

pub use mail_verifier::{mail_verifier_workflow, MailVerifierWorkflow, MAIL_VERIFIER_WORKFLOW_ID};

/// Errors that abort a workflow run
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid workflow input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("{name} not found")]
    AgentNotFound { name: String },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One stage of a workflow
#[async_trait]
pub trait Step: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn id(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, WorkflowError>;
}

/// A step that logs its start and finish inside its own span
#[derive(Debug, Clone)]
pub struct Traced<S>(pub S);

#[async_trait]
impl<S: Step> Step for Traced<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn id(&self) -> &str {
        self.0.id()
    }

    fn description(&self) -> &str {
        self.0.description()
    }

    async fn execute(&self, input: S::Input) -> Result<S::Output, WorkflowError> {
        let span = info_span!("step", id = self.0.id());
        async {
            info!("step started");
            let output = self.0.execute(input).await?;
            info!("step finished");
            Ok(output)
        }
        .instrument(span)
        .await
    }
}

/// Two steps run one after the other
///
/// A composed step reports the id and description of its last stage.
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

#[async_trait]
impl<A, B> Step for Then<A, B>
where
    A: Step,
    B: Step<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn id(&self) -> &str {
        self.second.id()
    }

    fn description(&self) -> &str {
        self.second.description()
    }

    async fn execute(&self, input: A::Input) -> Result<B::Output, WorkflowError> {
        let intermediate = self.first.execute(input).await?;
        self.second.execute(intermediate).await
    }
}

/// A named chain of steps
#[derive(Debug, Clone)]
pub struct Workflow<S> {
    id: String,
    steps: Vec<String>,
    chain: S,
}

impl<S: Step> Workflow<S> {
    pub fn new(id: impl Into<String>, first: S) -> Workflow<Traced<S>> {
        Workflow {
            id: id.into(),
            steps: vec![first.id().to_string()],
            chain: Traced(first),
        }
    }

    /// Append `next`, fed by the output of the current chain
    pub fn then<N>(mut self, next: N) -> Workflow<Then<S, Traced<N>>>
    where
        N: Step<Input = S::Output>,
    {
        self.steps.push(next.id().to_string());
        Workflow {
            id: self.id,
            steps: self.steps,
            chain: Then {
                first: self.chain,
                second: Traced(next),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Step ids in execution order
    pub fn step_ids(&self) -> &[String] {
        &self.steps
    }

    pub async fn run(&self, input: S::Input) -> Result<S::Output, WorkflowError> {
        let span = info_span!("workflow", id = %self.id);
        async {
            info!(steps = ?self.steps, "workflow started");
            let output = self.chain.execute(input).await?;
            info!("workflow finished");
            Ok(output)
        }
        .instrument(span)
        .await
    }
}
