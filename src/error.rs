//! Error types shared by the gateway, question generator and conversation.

use thiserror::Error;

/// Marker prepended to failure messages shown in the chat.
pub const FAILURE_MARKER: &str = "❌";

/// Outcome of a failed language-model call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No credential configured; raised before any network call
    #[error("API key not configured. Please set TOGETHER_API_KEY in your .env file.")]
    NotConfigured,

    #[error("Authentication failed. Please check your API key.")]
    Unauthenticated,

    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimited,

    #[error("API Error: {0}")]
    Http(u16),

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Connection error. Please check your internet connection.")]
    Connection,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl GatewayError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthenticated,
            429 => Self::RateLimited,
            other => Self::Http(other),
        }
    }

    pub fn user_message(&self) -> String {
        format!("{} {}", FAILURE_MARKER, self)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionError {
    #[error("No technologies to generate questions for")]
    NoTechnologies,

    #[error("Question generation for {technology} failed: {source}")]
    Gateway {
        technology: String,
        #[source]
        source: GatewayError,
    },

    #[error("The model returned an empty question for {technology}")]
    EmptyQuestion { technology: String },
}

/// Faults that abort a turn without touching the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("No question at position {index} (only {total} generated)")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("Tech stack is empty in stage {stage}")]
    MissingTechStack { stage: &'static str },

    #[error("All candidate fields are already filled")]
    NothingToGather,
}
