use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::{
    base::Provider, configs::ProviderConfig, errors::ProviderError,
    huggingface::HuggingFaceProvider, ollama::OllamaProvider, openai::OpenAiProvider,
};

/// The backends a chat can be routed to, named the way clients select them
#[derive(
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum ProviderType {
    #[strum(serialize = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
    #[strum(serialize = "hf")]
    #[serde(rename = "hf")]
    HuggingFace,
    #[strum(serialize = "ollama")]
    #[serde(rename = "ollama")]
    Ollama,
}

pub fn get_provider(config: ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Arc::new(OpenAiProvider::new(openai_config)?)),
        ProviderConfig::HuggingFace(hf_config) => {
            Ok(Arc::new(HuggingFaceProvider::new(hf_config)?))
        }
        ProviderConfig::Ollama(ollama_config) => Ok(Arc::new(OllamaProvider::new(ollama_config)?)),
    }
}

/// Lazily built, shared backend clients, at most one per provider type.
///
/// A configuration registered for a type wins over the environment. A failed build caches
/// nothing, so the next request tries again.
#[derive(Default)]
pub struct ProviderPool {
    providers: Mutex<HashMap<ProviderType, Arc<dyn Provider>>>,
    configs: HashMap<ProviderType, ProviderConfig>,
}

impl ProviderPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.configs.insert(config.provider_type(), config);
        self
    }

    /// Register an already built provider, used in place of building one
    pub fn with_provider(self, provider_type: ProviderType, provider: Arc<dyn Provider>) -> Self {
        self.lock().insert(provider_type, provider);
        self
    }

    pub fn get(&self, provider_type: ProviderType) -> Result<Arc<dyn Provider>, ProviderError> {
        let mut providers = self.lock();
        if let Some(provider) = providers.get(&provider_type) {
            return Ok(Arc::clone(provider));
        }

        let config = match self.configs.get(&provider_type) {
            Some(config) => config.clone(),
            None => ProviderConfig::from_env(provider_type)?,
        };
        let provider = get_provider(config)?;
        providers.insert(provider_type, Arc::clone(&provider));
        tracing::info!(provider = %provider_type, "initialized provider");
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ProviderType, Arc<dyn Provider>>> {
        // the map is never left half-updated, so a poisoned lock is still usable
        self.providers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
