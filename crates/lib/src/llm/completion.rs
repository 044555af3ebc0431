//! Text completion over an OpenAI-compatible API (POST {base}/chat/completions).
//!
//! Single user turn, non-streaming. Only the first choice's content is used.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion api key not configured")]
    NotConfigured,
}

#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Complete `prompt`; returns the assistant text (possibly empty).
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Clone)]
pub struct CompletionClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            model: model.into(),
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionApi for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let key = self.api_key.as_deref().ok_or(CompletionError::NotConfigured)?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{} {}", status, body)));
        }
        let data: ChatCompletionResponse = res.json().await?;
        Ok(data.into_content())
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> String {
        self.choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default()
    }
}
