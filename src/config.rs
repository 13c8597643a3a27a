//! Application configuration

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::{
    agent::{DEFAULT_LAST_MESSAGES, DEFAULT_MAX_STEPS},
    storage::StorageUrl,
};

/// Default address the server listens on
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 4111);

/// Runtime configuration for the agents and the server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,

    pub mailboxlayer_api_key: Option<String>,

    pub openai_api_key: Option<String>,

    pub google_api_key: Option<String>,

    /// Conversation memory location
    pub memory_url: StorageUrl,

    /// Score store location
    pub storage_url: StorageUrl,

    /// Timeout for outbound HTTP calls; unset waits indefinitely
    pub http_timeout: Option<Duration>,

    /// Model calls allowed per generation
    pub max_steps: usize,

    /// Remembered messages replayed into each thread
    pub last_messages: usize,
}

impl AppConfig {
    /// Create a configuration with default settings and no credentials
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR,
            mailboxlayer_api_key: None,
            openai_api_key: None,
            google_api_key: None,
            memory_url: StorageUrl::File("./mailverifier.jsonl".into()),
            storage_url: StorageUrl::InMemory,
            http_timeout: None,
            max_steps: DEFAULT_MAX_STEPS,
            last_messages: DEFAULT_LAST_MESSAGES,
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_mailboxlayer_api_key(mut self, key: Option<String>) -> Self {
        self.mailboxlayer_api_key = key;
        self
    }

    pub fn with_openai_api_key(mut self, key: Option<String>) -> Self {
        self.openai_api_key = key;
        self
    }

    pub fn with_google_api_key(mut self, key: Option<String>) -> Self {
        self.google_api_key = key;
        self
    }

    pub fn with_memory_url(mut self, url: StorageUrl) -> Self {
        self.memory_url = url;
        self
    }

    pub fn with_storage_url(mut self, url: StorageUrl) -> Self {
        self.storage_url = url;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_last_messages(mut self, last_messages: usize) -> Self {
        self.last_messages = last_messages;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:4111");
        assert_eq!(config.storage_url, StorageUrl::InMemory);
        assert_eq!(config.memory_url.to_string(), "file:./mailverifier.jsonl");
        assert!(config.http_timeout.is_none());
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.last_messages, 10);
    }

    #[test]
    fn test_builder() {
        let config = AppConfig::new()
            .with_mailboxlayer_api_key(Some("k".into()))
            .with_http_timeout(Some(Duration::from_secs(10)))
            .with_memory_url(StorageUrl::InMemory)
            .with_last_messages(4);

        assert_eq!(config.last_messages, 4);
        assert_eq!(config.mailboxlayer_api_key.as_deref(), Some("k"));
        assert_eq!(config.http_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.memory_url, StorageUrl::InMemory);
    }
}
