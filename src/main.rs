use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mailverifier_a2a::{
    agent::{DEFAULT_LAST_MESSAGES, DEFAULT_MAX_STEPS},
    agents::Runtime,
    config::{AppConfig, DEFAULT_BIND_ADDR},
    server,
    storage::StorageUrl,
    workflow::{mail_verifier::VerifyEmailInput, mail_verifier_workflow},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mailverifier", about = "Email verification and weather agents over A2A")]
struct Args {
    #[arg(long, env = "MAILVERIFIER_BIND_ADDR", default_value_t = DEFAULT_BIND_ADDR)]
    bind_addr: SocketAddr,

    #[arg(long, env = "MAILBOXLAYER_API_KEY", hide_env_values = true)]
    mailboxlayer_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "GOOGLE_GENERATIVE_AI_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// Conversation memory, `:memory:` or `file:<path>`
    #[arg(long, env = "MAILVERIFIER_MEMORY_URL", default_value = "file:./mailverifier.jsonl")]
    memory_url: StorageUrl,

    /// Score store, `:memory:` or `file:<path>`
    #[arg(long, env = "MAILVERIFIER_STORAGE_URL", default_value = ":memory:")]
    storage_url: StorageUrl,

    /// Timeout in seconds for outbound HTTP calls
    #[arg(long, env = "MAILVERIFIER_HTTP_TIMEOUT")]
    http_timeout: Option<u64>,

    #[arg(long, env = "MAILVERIFIER_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Remembered messages replayed into each conversation
    #[arg(long, env = "MAILVERIFIER_LAST_MESSAGES", default_value_t = DEFAULT_LAST_MESSAGES)]
    last_messages: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the A2A endpoint (default)
    Serve,
    /// Run the mail verifier workflow once and print the summary
    Verify { email: String },
}

impl Args {
    fn config(&self) -> AppConfig {
        AppConfig::new()
            .with_bind_addr(self.bind_addr)
            .with_mailboxlayer_api_key(self.mailboxlayer_api_key.clone())
            .with_openai_api_key(self.openai_api_key.clone())
            .with_google_api_key(self.google_api_key.clone())
            .with_memory_url(self.memory_url.clone())
            .with_storage_url(self.storage_url.clone())
            .with_http_timeout(self.http_timeout.map(Duration::from_secs))
            .with_max_steps(self.max_steps)
            .with_last_messages(self.last_messages)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = args.config();
    let runtime = Runtime::from_config(&config).context("failed to build agents")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let listener = tokio::net::TcpListener::bind(config.bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", config.bind_addr))?;
            server::serve(listener, runtime.registry).await?;
        }
        Command::Verify { email } => {
            let workflow = mail_verifier_workflow(runtime.mailboxlayer, runtime.registry);
            info!(workflow = workflow.id(), %email, "running workflow");
            let output = workflow.run(VerifyEmailInput { email }).await?;
            println!("{}", output.summary);
        }
    }

    Ok(())
}
