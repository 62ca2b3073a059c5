use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use courier::errors::AgentError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
    #[error("Tool timeout must be at least one second")]
    ZeroToolTimeout,
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Failures of an HTTP request, rendered as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Error initializing provider {provider}: {message}")]
    ProviderInit { provider: String, message: String },
    #[error("Error during generation: {0}")]
    Generation(AgentError),
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(message) => ApiError::InvalidRequest(message),
            other => ApiError::Generation(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProviderInit { .. } | ApiError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_errors_map_to_status() {
        let invalid: ApiError = AgentError::InvalidInput("message must not be empty".into()).into();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.to_string(), "message must not be empty");

        let rounds: ApiError = AgentError::MaxRoundsExceeded(25).into();
        assert_eq!(rounds.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(rounds.to_string().starts_with("Error during generation: "));
    }
}
