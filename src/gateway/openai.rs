//! OpenAI-compatible `/chat/completions` gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use super::{Completion, CompletionGateway, GatewayError, Result};
use crate::domain::GatewayConfig;

/// Returned when the endpoint answers successfully but with no choices.
pub const NO_RESPONSE_TEXT: &str = "No response found.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    top_p: f32,
    n: u32,
    stream: bool,
    max_tokens: u32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: usize,
}

#[derive(Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    config: GatewayConfig,
}

impl OpenAiGateway {
    pub fn new(api_key: impl Into<String>, config: GatewayConfig) -> Result<Self> {
        let client =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self { client, api_key: api_key.into(), endpoint, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            n: 1,
            stream: false,
            max_tokens: self.config.max_tokens,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

/// Extract the first choice's text and the reported usage.
fn parse_response(body: &str) -> Result<Completion> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let used_tokens = response.usage.map(|u| u.total_tokens);
    let text = match response.choices.into_iter().next() {
        // Some deployments double-escape newlines in the content.
        Some(choice) => choice.message.content.unwrap_or_default().replace("\\n", "\n"),
        None => NO_RESPONSE_TEXT.to_string(),
    };
    Ok(Completion { text, used_tokens })
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), %body, "completion request failed");
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let completion = parse_response(&body)?;
        tracing::debug!(used_tokens = ?completion.used_tokens, "completion received");
        Ok(completion)
    }
}
