use thiserror::Error;

/// Anything that keeps a backend from producing a usable response.
///
/// The agent loop treats every variant the same way (the turn ends with a fallback
/// message) but the distinction is kept for logs and callers building providers directly.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Provider API error: {0}")]
    Api(String),

    #[error("Context length exceeded. Message: {0}")]
    ContextLengthExceeded(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
