//! Resolution of `provider/model` ids to configured model clients

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc, time::Duration};

use url::Url;

use crate::transport::{AuthCredentials, HttpTransport, TransportError};

use super::{LanguageModel, ModelError, OpenAiCompatibleModel};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GOOGLE_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A parsed `provider/model` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    pub provider: String,
    pub name: String,
}

impl FromStr for ModelId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((provider, name)) if !provider.is_empty() && !name.is_empty() => Ok(Self {
                provider: provider.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ModelError::InvalidModelId(s.to_string())),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// Endpoint and credentials of one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    /// Environment variable the key is read from, for error messages
    pub key_env_var: String,
}

impl ProviderConfig {
    pub fn new(base_url: Url, api_key: Option<String>, key_env_var: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key,
            key_env_var: key_env_var.into(),
        }
    }
}

/// Maps model ids to model clients by provider prefix
#[derive(Debug, Clone, Default)]
pub struct ModelRouter {
    providers: HashMap<String, ProviderConfig>,
    timeout: Option<Duration>,
}

impl ModelRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the `openai` and `google` providers
    pub fn with_default_providers(
        openai_key: Option<String>,
        google_key: Option<String>,
    ) -> Result<Self, ModelError> {
        let openai = Url::parse(OPENAI_BASE_URL).map_err(TransportError::from)?;
        let google = Url::parse(GOOGLE_OPENAI_BASE_URL).map_err(TransportError::from)?;

        Ok(Self::new()
            .with_provider("openai", ProviderConfig::new(openai, openai_key, "OPENAI_API_KEY"))
            .with_provider(
                "google",
                ProviderConfig::new(google, google_key, "GOOGLE_GENERATIVE_AI_API_KEY"),
            ))
    }

    /// Register or replace a provider
    pub fn with_provider(mut self, name: impl Into<String>, config: ProviderConfig) -> Self {
        self.providers.insert(name.into(), config);
        self
    }

    /// Bound every model request by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the model client for `model_id`
    ///
    /// A provider without an API key still resolves; its requests fail
    /// with [`ModelError::MissingApiKey`].
    pub fn resolve(&self, model_id: &str) -> Result<Arc<dyn LanguageModel>, ModelError> {
        let id: ModelId = model_id.parse()?;
        let provider = self
            .providers
            .get(&id.provider)
            .ok_or_else(|| ModelError::UnknownProvider(id.provider.clone()))?;

        let transport = HttpTransport::with_timeout(provider.base_url.clone(), self.timeout)?;
        let auth = provider.api_key.clone().map(AuthCredentials::bearer);

        Ok(Arc::new(OpenAiCompatibleModel::new(
            transport,
            id.to_string(),
            id.name,
            auth,
            provider.key_env_var.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_id() {
        let id: ModelId = "google/gemini-2.5-flash".parse().unwrap();
        assert_eq!(id.provider, "google");
        assert_eq!(id.name, "gemini-2.5-flash");
        assert_eq!(id.to_string(), "google/gemini-2.5-flash");

        assert!("gpt-4o".parse::<ModelId>().is_err());
        assert!("/gpt-4o".parse::<ModelId>().is_err());
    }

    #[test]
    fn test_resolve_known_and_unknown_providers() {
        let router = ModelRouter::with_default_providers(Some("sk".into()), None).unwrap();

        let model = router.resolve("openai/gpt-4o-mini").unwrap();
        assert_eq!(model.model_id(), "openai/gpt-4o-mini");

        assert!(router.resolve("google/gemini-2.5-pro").is_ok());
        assert!(matches!(
            router.resolve("anthropic/some-model"),
            Err(ModelError::UnknownProvider(p)) if p == "anthropic"
        ));
    }
}
