use std::sync::Arc;

use indoc::indoc;
use serde::Serialize;

use crate::errors::{AgentError, AgentResult};
use crate::history::MessageHistory;
use crate::models::message::Message;
use crate::providers::base::{GenerationParams, Provider};
use crate::providers::utils::ensure_unique_tool_call_ids;
use crate::tools::ToolRegistry;

/// Returned in place of an answer when the backend fails mid-turn
pub const FALLBACK_MESSAGE: &str = "Sorry, there was an error generating the response";

pub const DEFAULT_MAX_ROUNDS: usize = 25;

pub const DEFAULT_SYSTEM_PROMPT: &str = indoc! {"
    You are a helpful and accurate assistant.
    - Use the tools available when the question requires it (files, weather, web search).
    - If you don't know something, use a tool instead of making it up.
    - Be concise, clear, and direct.
    - Maintain the context of the conversation"};

/// The answer to one user turn, with a line per tool call made along the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub content: String,
    pub tool_log: Vec<String>,
}

/// Agent drives one conversation: it asks the provider for the next step and runs the
/// tools it requests until the provider answers in plain text
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    history: MessageHistory,
    max_rounds: Option<usize>,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            history: MessageHistory::new(DEFAULT_SYSTEM_PROMPT),
            max_rounds: Some(DEFAULT_MAX_ROUNDS),
        }
    }

    /// Start the conversation from a different system message
    pub fn with_system_prompt<S: Into<String>>(mut self, system_prompt: S) -> Self {
        self.history = MessageHistory::new(system_prompt);
        self
    }

    /// Limit the tool rounds in one turn, `None` for no limit
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn max_rounds(&self) -> Option<usize> {
        self.max_rounds
    }

    /// Run one user turn to completion.
    ///
    /// Invalid input is rejected before the history is touched. Provider failures end the
    /// turn with [`FALLBACK_MESSAGE`]; whatever was appended up to that point stays.
    pub async fn process(&mut self, input: &str, params: &GenerationParams) -> AgentResult<Reply> {
        if input.trim().is_empty() {
            return Err(AgentError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        params.validate()?;

        self.history.push(Message::user(input))?;

        let mut tool_log = Vec::new();
        let mut rounds = 0;
        loop {
            let response = match self
                .provider
                .generate(self.history.messages(), self.registry.describe(), params)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(error = %e, "provider failed to generate a response");
                    return Ok(Reply {
                        content: FALLBACK_MESSAGE.to_string(),
                        tool_log,
                    });
                }
            };

            if response.tool_calls.is_empty() {
                let content = response.content.unwrap_or_default();
                self.history.push(Message::assistant(content.clone()))?;
                tracing::info!(
                    rounds,
                    tool_calls = tool_log.len(),
                    input_tokens = ?response.usage.input_tokens,
                    output_tokens = ?response.usage.output_tokens,
                    "turn complete"
                );
                return Ok(Reply { content, tool_log });
            }

            if let Some(max_rounds) = self.max_rounds {
                if rounds >= max_rounds {
                    tracing::warn!(max_rounds, "tool call round limit reached");
                    return Err(AgentError::MaxRoundsExceeded(max_rounds));
                }
            }
            rounds += 1;
            tracing::debug!(round = rounds, calls = response.tool_calls.len(), "running tools");

            let mut tool_calls = response.tool_calls;
            ensure_unique_tool_call_ids(&mut tool_calls);
            self.history
                .push(Message::assistant_tool_calls(tool_calls.clone()))?;

            for call in &tool_calls {
                let (arguments, output) = self.registry.dispatch(call).await;
                let line = format!("Calling tool: {} with arguments: {}", call.name, arguments);
                tracing::info!("{}", line);
                tool_log.push(line);
                self.history
                    .push(Message::tool_result(&call.id, &call.name, output))?;
            }
        }
    }
}
