use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use super::base::{GenerationParams, ProviderResponse, Usage};
use super::errors::ProviderError;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::Assistant if message.has_tool_calls() => {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": sanitize_function_name(&call.name),
                                "arguments": call.arguments,
                            }
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": null,
                    "tool_calls": tool_calls,
                })
            }
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
                "name": message.name,
                "content": message.text(),
            }),
            role => json!({
                "role": role.as_str(),
                "content": message.text(),
            }),
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>, ProviderError> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(ProviderError::Configuration(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Build a chat completions payload shared by the OpenAI compatible backends
pub fn openai_chat_payload(
    model: &str,
    messages: &[Message],
    tools: &[Tool],
    params: &GenerationParams,
) -> Result<Value, ProviderError> {
    let mut payload = json!({
        "model": model,
        "messages": messages_to_openai_spec(messages),
        "temperature": params.temperature,
        "top_p": params.top_p,
        "max_tokens": params.max_tokens,
    });

    let tools_spec = tools_to_openai_spec(tools)?;
    if !tools_spec.is_empty() {
        payload["tools"] = json!(tools_spec);
        payload["tool_choice"] = json!("auto");
    }

    Ok(payload)
}

/// Convert OpenAI's API response to a provider response
pub fn openai_response_to_provider_response(
    response: &Value,
) -> Result<ProviderResponse, ProviderError> {
    if let Some(error) = response.get("error") {
        if let Some(err) = check_openai_context_length_error(error) {
            return Err(err);
        }
        return Err(ProviderError::Api(error.to_string()));
    }

    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            ProviderError::MalformedResponse("response has no choices[0].message".into())
        })?;

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for (index, call) in calls.iter().enumerate() {
            let function = call.get("function").unwrap_or(call);
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ProviderError::MalformedResponse(format!("tool call {} has no name", index))
                })?;
            let id = call
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("call_{}", index + 1));
            tool_calls.push(ToolCall::new(
                id,
                name,
                arguments_to_string(function.get("arguments")),
            ));
        }
    }
    ensure_unique_tool_call_ids(&mut tool_calls);

    let content = if tool_calls.is_empty() {
        message
            .get("content")
            .and_then(|v| v.as_str())
            .map(String::from)
    } else {
        None
    };

    Ok(ProviderResponse {
        content,
        tool_calls,
        usage: get_openai_usage(response),
    })
}

/// Tool arguments arrive as a JSON string from most backends, but some send the object itself
pub fn arguments_to_string(arguments: Option<&Value>) -> String {
    match arguments {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Give every empty or repeated id a fresh `call_<n>` that no other call in the turn uses
pub fn ensure_unique_tool_call_ids(tool_calls: &mut [ToolCall]) {
    let taken: HashSet<String> = tool_calls.iter().map(|call| call.id.clone()).collect();
    let mut seen = HashSet::new();
    let mut next = 1;
    for call in tool_calls.iter_mut() {
        if !call.id.is_empty() && seen.insert(call.id.clone()) {
            continue;
        }
        let fresh = loop {
            let candidate = format!("call_{}", next);
            next += 1;
            if !taken.contains(&candidate) && !seen.contains(&candidate) {
                break candidate;
            }
        };
        seen.insert(fresh.clone());
        call.id = fresh;
    }
}

pub fn get_openai_usage(data: &Value) -> Usage {
    let Some(usage) = data.get("usage") else {
        return Usage::default();
    };

    let input_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let output_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);

    let total_tokens = usage
        .get("total_tokens")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Map an HTTP response to its JSON body or the matching provider error
pub async fn handle_response(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    match status {
        StatusCode::OK => response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::Authentication(format!("{}: {}", status, body)))
        }
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            Err(ProviderError::ServerError(status.as_u16()))
        }
        _ => Err(ProviderError::RequestFailed {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

fn sanitize_function_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let re = INVALID.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid regex"));
    re.replace_all(name, "_").to_string()
}

pub fn check_openai_context_length_error(error: &Value) -> Option<ProviderError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ProviderError::ContextLengthExceeded(message))
    } else {
        None
    }
}
