use std::sync::Arc;

use courier::agent::Agent;
use courier::providers::errors::ProviderError;
use courier::providers::factory::{ProviderPool, ProviderType};
use courier::session::SessionRegistry;
use courier::tools::{ToolContext, ToolRegistry};

use crate::configuration::{AgentSettings, Settings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub providers: Arc<ProviderPool>,
    pub tools: Arc<ToolRegistry>,
    pub agent: Arc<AgentSettings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let providers = settings
            .providers
            .configs()
            .into_iter()
            .fold(ProviderPool::new(), ProviderPool::with_config);
        let context = ToolContext::new(settings.agent.workdir.clone())
            .with_timeout(settings.agent.tool_timeout());

        Self::from_parts(providers, ToolRegistry::new(context), settings.agent)
    }

    pub fn from_parts(providers: ProviderPool, tools: ToolRegistry, agent: AgentSettings) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            providers: Arc::new(providers),
            tools: Arc::new(tools),
            agent: Arc::new(agent),
        }
    }

    /// A new agent for a session, talking to the shared provider of `provider_type`
    pub fn build_agent(&self, provider_type: ProviderType) -> Result<Agent, ProviderError> {
        let provider = self.providers.get(provider_type)?;
        let agent = Agent::new(provider, Arc::clone(&self.tools))
            .with_max_rounds(self.agent.max_rounds());

        Ok(match &self.agent.system_prompt {
            Some(prompt) => agent.with_system_prompt(prompt.clone()),
            None => agent,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use async_trait::async_trait;
    use courier::models::message::Message;
    use courier::models::tool::Tool;
    use courier::providers::base::{GenerationParams, Provider, ProviderResponse};
    use std::sync::Mutex;

    /// Answers every generation from a fixed script
    pub struct ScriptedProvider {
        responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    }

    impl ScriptedProvider {
        pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn generate(
            &self,
            _messages: &[Message],
            _tools: &[Tool],
            _params: &GenerationParams,
        ) -> Result<ProviderResponse, ProviderError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(ProviderResponse::text("(no more responses)"))
            } else {
                responses.remove(0)
            }
        }
    }

    /// State whose `ollama` backend is the given script and whose tools work in `workdir`
    pub fn scripted_state(
        responses: Vec<Result<ProviderResponse, ProviderError>>,
        workdir: &std::path::Path,
    ) -> AppState {
        let pool = ProviderPool::new().with_provider(
            ProviderType::Ollama,
            Arc::new(ScriptedProvider::new(responses)),
        );
        AppState::from_parts(
            pool,
            ToolRegistry::new(ToolContext::new(workdir)),
            AgentSettings::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::scripted_state;
    use super::*;
    use courier::agent::DEFAULT_SYSTEM_PROMPT;
    use courier::providers::configs::{OpenAiProviderConfig, ProviderConfig};

    #[test]
    fn test_build_agent_uses_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut state = scripted_state(Vec::new(), dir.path());
        assert_eq!(
            state.build_agent(ProviderType::Ollama).unwrap().history()[0].text(),
            DEFAULT_SYSTEM_PROMPT
        );

        state.agent = Arc::new(AgentSettings {
            max_rounds: 0,
            system_prompt: Some("Be brief".to_string()),
            ..Default::default()
        });
        let agent = state.build_agent(ProviderType::Ollama).unwrap();
        assert_eq!(agent.history()[0].text(), "Be brief");
        assert_eq!(agent.max_rounds(), None);
    }

    #[test]
    fn test_build_agent_surfaces_provider_errors() {
        let pool = ProviderPool::new().with_config(ProviderConfig::OpenAi(OpenAiProviderConfig {
            host: "http://localhost".to_string(),
            api_key: String::new(),
            model: "m".to_string(),
        }));
        let state = AppState::from_parts(
            pool,
            ToolRegistry::new(ToolContext::default()),
            AgentSettings::default(),
        );
        assert!(matches!(
            state.build_agent(ProviderType::OpenAi),
            Err(ProviderError::Configuration(_))
        ));
    }
}
