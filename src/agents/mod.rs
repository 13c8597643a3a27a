//! The agents served by this crate and their wiring from configuration

pub mod mail_verifier;
pub mod weather;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
    agent::{Agent, AgentRegistry},
    config::AppConfig,
    model::{ModelError, ModelRouter},
    scorer::{mail::EXPLANATION_JUDGE_MODEL, weather::TRANSLATION_JUDGE_MODEL},
    storage::MemoryStore,
    tools::{
        mailboxlayer::MAILBOXLAYER_BASE_URL,
        weather::{FORECAST_BASE_URL, GEOCODING_BASE_URL},
        MailboxLayerClient, WeatherTool,
    },
    transport::{HttpTransport, TransportError},
};

pub use mail_verifier::mail_verifier_agent;
pub use weather::weather_agent;

pub const WEATHER_AGENT_ID: &str = "weather-agent";
pub const MAIL_VERIFIER_AGENT_ID: &str = "mail-verifier-agent";

/// Errors raised while assembling the runtime
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Everything the server and the workflow need, built once at start-up
#[derive(Debug, Clone)]
pub struct Runtime {
    pub registry: Arc<AgentRegistry>,
    pub mailboxlayer: MailboxLayerClient<HttpTransport>,
    pub memory: Arc<MemoryStore>,
    pub scores: Arc<MemoryStore>,
}

impl Runtime {
    /// Build the agents, tools and stores described by `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, SetupError> {
        let router = ModelRouter::with_default_providers(
            config.openai_api_key.clone(),
            config.google_api_key.clone(),
        )?
        .with_timeout(config.http_timeout);

        let http = |base: &str| -> Result<HttpTransport, TransportError> {
            HttpTransport::with_timeout(Url::parse(base)?, config.http_timeout)
        };

        let mailboxlayer = MailboxLayerClient::new(
            http(MAILBOXLAYER_BASE_URL)?,
            config.mailboxlayer_api_key.clone(),
        );
        let weather_tool = WeatherTool::new(http(GEOCODING_BASE_URL)?, http(FORECAST_BASE_URL)?);

        let memory = Arc::new(MemoryStore::open(config.memory_url.clone()));
        let scores = Arc::new(MemoryStore::open(config.storage_url.clone()));

        let finish = |agent: Agent| {
            agent
                .with_memory(memory.clone())
                .with_score_store(scores.clone())
                .with_max_steps(config.max_steps)
                .with_last_messages(config.last_messages)
        };

        let registry = AgentRegistry::new()
            .with_agent(finish(weather_agent(
                router.resolve(weather::WEATHER_AGENT_MODEL)?,
                router.resolve(TRANSLATION_JUDGE_MODEL)?,
                weather_tool,
            )))
            .with_agent(finish(mail_verifier_agent(
                router.resolve(mail_verifier::MAIL_VERIFIER_AGENT_MODEL)?,
                router.resolve(EXPLANATION_JUDGE_MODEL)?,
                mailboxlayer.clone(),
            )));

        info!(
            agents = ?registry.ids().collect::<Vec<_>>(),
            memory = %config.memory_url,
            storage = %config.storage_url,
            "runtime ready"
        );

        Ok(Self {
            registry: Arc::new(registry),
            mailboxlayer,
            memory,
            scores,
        })
    }
}
