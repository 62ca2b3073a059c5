use std::str::FromStr;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use courier::history::MessageHistory;
use courier::models::role::Role;
use courier::providers::base::GenerationParams;
use courier::providers::factory::ProviderType;
use courier::session::new_session_id;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    pub provider: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    fn params(&self) -> GenerationParams {
        let mut params = GenerationParams::default().with_temperature(self.temperature);
        if let Some(top_p) = self.top_p {
            params = params.with_top_p(top_p);
        }
        if let Some(max_tokens) = self.max_tokens {
            params = params.with_max_tokens(max_tokens);
        }
        params
    }
}

/// What happened inside the turn, for clients that show the agent at work
#[derive(Debug, Serialize)]
pub struct InternalFlow {
    pub messages: MessageHistory,
    pub params: GenerationParams,
    pub tool_logs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub role: Role,
    pub content: String,
    pub provider_used: String,
    pub session_id: String,
    pub logs: Vec<String>,
    pub internal_flow: InternalFlow,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

    let provider_type = ProviderType::from_str(&request.provider).map_err(|_| {
        ApiError::InvalidRequest("Invalid provider. Use 'openai', 'hf' or 'ollama'.".to_string())
    })?;

    // Reject bad input before a session is created for it
    if request.message.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "message must not be empty".to_string(),
        ));
    }
    let params = request.params();
    params.validate()?;

    let session_id = request
        .session_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(new_session_id);

    // A session keeps the provider it was created with
    let agent = state
        .sessions
        .get_or_create(&session_id, || state.build_agent(provider_type))
        .map_err(|e| ApiError::ProviderInit {
            provider: request.provider.clone(),
            message: e.to_string(),
        })?;

    let mut agent = agent.lock().await;
    let reply = agent.process(&request.message, &params).await?;
    tracing::info!(
        session_id = %session_id,
        provider = %provider_type,
        tool_calls = reply.tool_log.len(),
        "chat turn complete"
    );

    Ok(Json(ChatResponse {
        role: Role::Assistant,
        content: reply.content,
        provider_used: request.provider,
        session_id,
        logs: reply.tool_log.clone(),
        internal_flow: InternalFlow {
            messages: agent.history().clone(),
            params,
            tool_logs: reply.tool_log,
        },
    }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .with_state(state)
}
