use super::errors::ProviderError;
use super::factory::ProviderType;

pub const OPENAI_HOST: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_MODEL: &str = "openai/gpt-4o-mini";
pub const HUGGINGFACE_HOST: &str = "https://router.huggingface.co/v1";
pub const HUGGINGFACE_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "llama3";

// Unified enum to wrap different provider configurations
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    OpenAi(OpenAiProviderConfig),
    HuggingFace(HuggingFaceProviderConfig),
    Ollama(OllamaProviderConfig),
}

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct OllamaProviderConfig {
    pub host: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::OpenAi(_) => ProviderType::OpenAi,
            ProviderConfig::HuggingFace(_) => ProviderType::HuggingFace,
            ProviderConfig::Ollama(_) => ProviderType::Ollama,
        }
    }

    /// Build the configuration of one backend from environment variables
    pub fn from_env(provider_type: ProviderType) -> Result<Self, ProviderError> {
        match provider_type {
            ProviderType::OpenAi => Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: get_env("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_HOST.to_string()),
                api_key: require_env("OPENROUTER_API_KEY")?,
                model: get_env("OPENAI_MODEL").unwrap_or_else(|| OPENAI_MODEL.to_string()),
            })),
            ProviderType::HuggingFace => {
                Ok(ProviderConfig::HuggingFace(HuggingFaceProviderConfig {
                    host: get_env("HF_BASE_URL").unwrap_or_else(|| HUGGINGFACE_HOST.to_string()),
                    api_key: require_env("HF_API_KEY")?,
                    model: get_env("HF_MODEL").unwrap_or_else(|| HUGGINGFACE_MODEL.to_string()),
                }))
            }
            ProviderType::Ollama => Ok(ProviderConfig::Ollama(OllamaProviderConfig {
                host: get_env("OLLAMA_BASE_URL").unwrap_or_else(|| OLLAMA_HOST.to_string()),
                model: get_env("OLLAMA_MODEL").unwrap_or_else(|| OLLAMA_MODEL.to_string()),
            })),
        }
    }

    /// Replace the model of whichever backend this config describes
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        let model = model.into();
        match &mut self {
            ProviderConfig::OpenAi(config) => config.model = model,
            ProviderConfig::HuggingFace(config) => config.model = model,
            ProviderConfig::Ollama(config) => config.model = model,
        }
        self
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn require_env(key: &str) -> Result<String, ProviderError> {
    get_env(key).ok_or_else(|| ProviderError::Configuration(format!("{} must be set", key)))
}
