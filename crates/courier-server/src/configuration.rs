use crate::error::ConfigError;
use axum::http::HeaderValue;
use config::{Config, Environment};
use courier::providers::configs::{
    HuggingFaceProviderConfig, OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig,
    HUGGINGFACE_HOST, HUGGINGFACE_MODEL, OLLAMA_HOST, OLLAMA_MODEL, OPENAI_HOST, OPENAI_MODEL,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS, `*` allows any
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.host, self.port);
        address
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(address))
    }

    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if self.cors_origins.iter().any(|origin| origin == "*") {
            return Ok(layer.allow_origin(Any));
        }

        let origins = self
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(layer.allow_origin(AllowOrigin::list(origins)))
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            host: default_openai_host(),
            api_key: None,
            model: default_openai_model(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HuggingFaceSettings {
    #[serde(default = "default_hf_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_hf_model")]
    pub model: String,
}

impl Default for HuggingFaceSettings {
    fn default() -> Self {
        Self {
            host: default_hf_host(),
            api_key: None,
            model: default_hf_model(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OllamaSettings {
    #[serde(default = "default_ollama_host")]
    pub host: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProvidersSettings {
    #[serde(default)]
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub hf: HuggingFaceSettings,
    #[serde(default)]
    pub ollama: OllamaSettings,
}

impl ProvidersSettings {
    /// Configurations for the backends that are fully configured here. A backend left out
    /// falls back to its plain environment variables when first used.
    pub fn configs(&self) -> Vec<ProviderConfig> {
        let mut configs = Vec::new();
        if let Some(api_key) = &self.openai.api_key {
            configs.push(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: self.openai.host.clone(),
                api_key: api_key.clone(),
                model: self.openai.model.clone(),
            }));
        }
        if let Some(api_key) = &self.hf.api_key {
            configs.push(ProviderConfig::HuggingFace(HuggingFaceProviderConfig {
                host: self.hf.host.clone(),
                api_key: api_key.clone(),
                model: self.hf.model.clone(),
            }));
        }
        configs.push(ProviderConfig::Ollama(OllamaProviderConfig {
            host: self.ollama.host.clone(),
            model: self.ollama.model.clone(),
        }));
        configs
    }
}

#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    /// Tool rounds allowed in one turn, 0 for no limit
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            tool_timeout_secs: default_tool_timeout_secs(),
            workdir: default_workdir(),
            system_prompt: None,
        }
    }
}

impl AgentSettings {
    pub fn max_rounds(&self) -> Option<usize> {
        match self.max_rounds {
            0 => None,
            n => Some(n),
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub providers: ProvidersSettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("COURIER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })?;

        if settings.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ZeroToolTimeout);
        }

        Ok(settings)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}

fn default_openai_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_hf_host() -> String {
    HUGGINGFACE_HOST.to_string()
}

fn default_hf_model() -> String {
    HUGGINGFACE_MODEL.to_string()
}

fn default_ollama_host() -> String {
    OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    OLLAMA_MODEL.to_string()
}

fn default_max_rounds() -> usize {
    courier::agent::DEFAULT_MAX_ROUNDS
}

fn default_tool_timeout_secs() -> u64 {
    courier::tools::DEFAULT_TOOL_TIMEOUT.as_secs()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}
