use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::ProviderError;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Sampling parameters passed through to the backend on every generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn validate(&self) -> AgentResult<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::InvalidInput(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(AgentError::InvalidInput(format!(
                "top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::InvalidInput(
                "max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    512
}

/// What a backend produced for one generation: either final text or tool requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

impl ProviderResponse {
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Default::default()
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Base trait for LLM backends (OpenAI compatible, Hugging Face, Ollama)
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next step of the conversation from the full message history.
    ///
    /// Implementations normalize their wire format so that a response carrying tool
    /// calls never also carries content.
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Tool],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_serialization() -> serde_json::Result<()> {
        let usage = Usage::new(Some(10), Some(20), Some(30));
        let serialized = serde_json::to_string(&usage)?;
        let deserialized: Usage = serde_json::from_str(&serialized)?;
        assert_eq!(usage, deserialized);

        let json_value: serde_json::Value = serde_json::from_str(&serialized)?;
        assert_eq!(json_value["input_tokens"], json!(10));
        assert_eq!(json_value["output_tokens"], json!(20));
        assert_eq!(json_value["total_tokens"], json!(30));
        Ok(())
    }

    #[test]
    fn test_generation_params_defaults() -> serde_json::Result<()> {
        let params: GenerationParams = serde_json::from_value(json!({"temperature": 0.2}))?;
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.max_tokens, 512);
        assert_eq!(GenerationParams::default().temperature, 0.7);
        Ok(())
    }

    #[test]
    fn test_generation_params_validation() {
        assert!(GenerationParams::default().validate().is_ok());
        assert!(GenerationParams::default()
            .with_temperature(2.0)
            .validate()
            .is_ok());
        assert!(matches!(
            GenerationParams::default().with_temperature(2.5).validate(),
            Err(AgentError::InvalidInput(_))
        ));
        assert!(GenerationParams::default()
            .with_temperature(-0.1)
            .validate()
            .is_err());
        assert!(GenerationParams::default().with_top_p(0.0).validate().is_err());
        assert!(GenerationParams::default()
            .with_max_tokens(0)
            .validate()
            .is_err());
    }
}
