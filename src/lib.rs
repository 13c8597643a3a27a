//! # Mail Verifier A2A
//!
//! An agent service that verifies email addresses with MailboxLayer and
//! reports the weather, exposed over the Agent2Agent (A2A) JSON-RPC binding.
//!
//! Requests flow through Tower's Service and Layer abstractions: the axum
//! route hands each envelope to [`service::A2aAdapterService`], wrapped by
//! [`layer::EnvelopeValidationLayer`].
//!
//! ## Features
//!
//! - **Agents**: tool-calling agents with thread memory and sampled scorers
//! - **Tools**: MailboxLayer verification and Open-Meteo weather lookups
//! - **Workflow**: a typed two-step mail verification pipeline
//! - **A2A**: `POST /a2a/agent/:agentId` returning completed tasks
//!
//! ## Example
//!
//! ```rust,no_run
//! use mailverifier_a2a::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::new();
//!     let runtime = Runtime::from_config(&config)?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     mailverifier_a2a::server::serve(listener, runtime.registry).await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod agents;
pub mod codec;
pub mod config;
pub mod layer;
pub mod model;
pub mod protocol;
pub mod scorer;
pub mod server;
pub mod service;
pub mod storage;
pub mod tools;
pub mod transport;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        agent::{Agent, AgentRegistry, GenerateOptions, GenerateOutput},
        agents::Runtime,
        config::AppConfig,
        model::{ChatMessage, LanguageModel},
        protocol::error::A2AError,
        protocol::{Message, MessagePart, Role, Task, TaskStatus},
        service::{A2aAdapterService, A2aRequest, A2aResponse},
        workflow::{mail_verifier_workflow, Workflow},
    };
}
