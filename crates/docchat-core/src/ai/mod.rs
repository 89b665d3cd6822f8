pub mod openrouter;

pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Reply used when the endpoint answers without usable content, and as the
/// user-visible apology when a request fails outright.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't respond.";

/// What can go wrong in a single completion attempt. None of these are fatal;
/// the controller turns each into the apology message.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Network unreachable, connection aborted, or the task carrying the
    /// request died.
    #[error("could not reach the completion endpoint: {0}")]
    Transport(String),
    #[error("completion request failed with status {0}")]
    RequestFailed(StatusCode),
    #[error("completion response was missing the expected reply field")]
    MalformedResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

/// A completion endpoint the controller can talk to. Object-safe so tests can
/// script replies without a network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Single attempt, no retry. `context` is appended to the question after
    /// a fixed separator when present.
    async fn complete(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, CompletionError>;
}
