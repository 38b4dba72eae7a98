//! Error types for decoding, submission and intake

use crate::types::ErrorCode;
use thiserror::Error;

/// Errors that can occur while decoding a raw message
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Failed to parse the MIME structure
    #[error("Failed to parse email structure: {0}")]
    Structure(String),

    /// Parsed, but no valid header field was found
    #[error("Message has no valid header fields")]
    NoHeaders,

    /// Decoded, but carries no addresses, subject, date, body or attachment
    #[error("Message has no recoverable content")]
    Empty,
}

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Reasons a payload is rejected before it is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Content must be at least {min} characters")]
    ContentTooShort { min: usize },

    #[error("Content cannot be empty or only whitespace")]
    ContentBlank,

    #[error("Payload exceeds {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("{field} exceeds {limit} characters")]
    FieldTooLong { field: &'static str, limit: usize },

    #[error("Payload could not be serialized: {0}")]
    Unserializable(String),
}

/// Failure of a single submission attempt
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Payload failed local checks, never retried
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structured error returned by the API
    #[error("{message}")]
    Api { code: String, message: String },

    /// Non-success status without a structured error body
    #[error("API error: {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// Transport failure or malformed response
    #[error("{0}")]
    Network(String),
}

impl SubmitError {
    /// Classify this failure for callers and the retry loop
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::Validation,
            Self::Api { code, .. } => ErrorCode::from_server(code),
            Self::Http { status, .. } => ErrorCode::Http(*status),
            Self::Network(_) => ErrorCode::Network,
        }
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SubmitError {
    fn from(err: serde_json::Error) -> Self {
        Self::Network(format!("Invalid JSON response: {err}"))
    }
}

/// Invalid runtime configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid API base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Reasons the intake handler drops a message before submission
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Email too large: {size} bytes exceeds {max} bytes")]
    TooLarge { size: usize, max: u64 },

    #[error("Rate limit exceeded for {sender}")]
    RateLimited { sender: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
