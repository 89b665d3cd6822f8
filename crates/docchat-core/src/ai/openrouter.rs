use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionBackend, CompletionError, FALLBACK_REPLY};

/// Fixed system instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Serialize)]
struct RequestMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<RequestMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// Client for an OpenRouter-style `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Outbound user content: the question alone, or with the uploaded document
/// appended after a fixed separator.
fn user_content(question: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => {
            format!("{question}\n\nContext:\n{context}")
        }
        _ => question.to_string(),
    }
}

/// A body that does not deserialize is malformed; a well-formed body with no
/// usable choice yields the fixed fallback reply.
fn parse_reply(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|_| CompletionError::MalformedResponse)?;

    Ok(response
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                RequestMessage {
                    role: "user".to_string(),
                    content: user_content(question, context),
                },
            ],
        };

        debug!(model = %self.model, "dispatching completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::RequestFailed(response.status()));
        }

        let body = response.text().await?;
        parse_reply(&body)
    }
}
