use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to the caller of [`crate::agent::Agent::process`]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum AgentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Exceeded the maximum of {0} tool call rounds in one turn")]
    MaxRoundsExceeded(usize),

    #[error("Invalid history: {0}")]
    InvalidHistory(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failures while running a tool. These never leave the agent loop, they are
/// turned into tool-result text so the model can react to them.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("{0}")]
    ExecutionError(String),

    #[error("Tool timed out after {0:?}")]
    Timeout(Duration),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::ExecutionError(err.to_string())
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::ExecutionError(err.to_string())
    }
}
