use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::base::{GenerationParams, Provider, ProviderResponse};
use super::configs::OpenAiProviderConfig;
use super::errors::ProviderError;
use super::utils::{handle_response, openai_chat_payload, openai_response_to_provider_response};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Chat completions against OpenAI or any compatible gateway (OpenRouter by default)
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "an API key is required for the openai provider".into(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value, ProviderError> {
        let url = format!("{}/chat/completions", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        handle_response(response).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Tool],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let payload = openai_chat_payload(&self.config.model, messages, tools, params)?;
        let response = self.post(payload).await?;
        openai_response_to_provider_response(&response)
    }
}
