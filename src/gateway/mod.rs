//! Completion endpoint abstraction.

use async_trait::async_trait;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Received non-200 response from completion API ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Text returned by one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Tokens the endpoint reports having billed, when it reports usage.
    pub used_tokens: Option<usize>,
}

impl Completion {
    pub fn new(text: impl Into<String>, used_tokens: usize) -> Self {
        Self { text: text.into(), used_tokens: Some(used_tokens) }
    }
}

/// Performs a single prompt → completion round trip.
///
/// Implementations do no throttling; admission is decided by the caller.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}
