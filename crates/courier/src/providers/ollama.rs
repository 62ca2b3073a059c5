use async_trait::async_trait;
use indoc::indoc;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;

use super::base::{GenerationParams, Provider, ProviderResponse, Usage};
use super::configs::OllamaProviderConfig;
use super::errors::ProviderError;
use super::utils::{arguments_to_string, ensure_unique_tool_call_ids, handle_response};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Appended to the system turn sent to the model when tools are available. Local models
/// are not assumed to support native tool calling, so they are asked to answer with this
/// JSON shape instead.
const TOOL_PROTOCOL: &str = indoc! {r#"
    If you need to call a tool, respond ONLY with JSON in this exact shape and nothing else:
    {"tool_calls": [{"id": "call_1", "function": {"name": "tool_name", "arguments": "<json string>"}}]}
    Otherwise answer normally in plain text.
    Available tools: "#};

/// Local models served by Ollama, with tool calls emulated through the prompt
pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> Result<Value, ProviderError> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let response = self.client.post(&url).json(&payload).send().await?;
        handle_response(response).await
    }

    fn get_usage(data: &Value) -> Usage {
        let input_tokens = data
            .get("prompt_eval_count")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let output_tokens = data
            .get("eval_count")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        };
        Usage::new(input_tokens, output_tokens, total_tokens)
    }
}

/// Render the history in the shape the model sees, including the tool protocol.
///
/// Works on a copy, the caller's history is left untouched.
fn messages_to_ollama_spec(messages: &[Message], tools: &[Tool]) -> Vec<Value> {
    let mut spec: Vec<Value> = messages
        .iter()
        .map(|message| match message.role {
            Role::Assistant if message.has_tool_calls() => json!({
                "role": "assistant",
                "content": tool_calls_to_protocol_text(&message.tool_calls),
            }),
            role => json!({
                "role": role.as_str(),
                "content": message.text(),
            }),
        })
        .collect();

    if !tools.is_empty() {
        let instruction = format!("{}{}", TOOL_PROTOCOL, tools_description(tools));
        match spec.first_mut() {
            Some(first) if first["role"] == "system" => {
                let content = first["content"].as_str().unwrap_or_default();
                first["content"] = json!(format!("{}\n{}", content, instruction));
            }
            _ => spec.insert(0, json!({"role": "system", "content": instruction})),
        }
    }

    spec
}

fn tools_description(tools: &[Tool]) -> String {
    let descriptions: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            })
        })
        .collect();
    Value::Array(descriptions).to_string()
}

/// Previous tool requests are replayed in the same protocol the model was asked to use
fn tool_calls_to_protocol_text(tool_calls: &[ToolCall]) -> String {
    let calls: Vec<Value> = tool_calls
        .iter()
        .map(|call| {
            json!({
                "id": call.id,
                "function": {"name": call.name, "arguments": call.arguments},
            })
        })
        .collect();
    json!({ "tool_calls": calls }).to_string()
}

/// Recover tool calls from a reply that follows the protocol, `None` for ordinary text
fn parse_emulated_tool_calls(content: &str) -> Option<Vec<ToolCall>> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").expect("valid regex")
    });

    let trimmed = content.trim();
    let body = fence
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let parsed: Value = serde_json::from_str(body).ok()?;
    let calls = parsed.get("tool_calls")?.as_array()?;

    let mut tool_calls: Vec<ToolCall> = calls
        .iter()
        .enumerate()
        .filter_map(|(index, call)| {
            let function = call.get("function").unwrap_or(call);
            let name = function.get("name")?.as_str()?;
            let id = call
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("call_{}", index + 1));
            Some(ToolCall::new(
                id,
                name,
                arguments_to_string(function.get("arguments")),
            ))
        })
        .collect();
    ensure_unique_tool_call_ids(&mut tool_calls);

    Some(tool_calls)
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[Tool],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let payload = json!({
            "model": self.config.model,
            "messages": messages_to_ollama_spec(messages, tools),
            "options": {
                "temperature": params.temperature,
                "top_p": params.top_p,
                "num_predict": params.max_tokens,
            },
            "stream": false,
        });

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(ProviderError::Api(error.to_string()));
        }

        let content = response
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("response has no message.content".into())
            })?;

        let usage = Self::get_usage(&response);
        match parse_emulated_tool_calls(content) {
            Some(tool_calls) if !tool_calls.is_empty() => {
                Ok(ProviderResponse::tool_calls(tool_calls).with_usage(usage))
            }
            _ => Ok(ProviderResponse::text(content).with_usage(usage)),
        }
    }
}
