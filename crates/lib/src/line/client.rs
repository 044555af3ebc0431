//! LINE Messaging API client: reply, push, and profile lookup.

use crate::line::Message;
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_API_BASE: &str = "https://api.line.me/v2/bot";

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("line api error: {0}")]
    Api(String),
    #[error("line channel access token not configured")]
    NotConfigured,
}

/// User profile from GET /profile/{userId}.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Outbound side of the messaging provider.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Answer an inbound event using its single-use reply token.
    async fn reply(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError>;
    /// Send to a user id without a reply token.
    async fn push(&self, to: &str, messages: &[Message]) -> Result<(), LineError>;
    async fn profile(&self, user_id: &str) -> Result<Profile, LineError>;
}

/// HTTP client for the Messaging API, authenticated with a channel access token.
#[derive(Clone)]
pub struct LineClient {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl LineClient {
    pub fn new(api_base: Option<String>, token: Option<String>) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            api_base,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn token(&self) -> Result<&str, LineError> {
        self.token.as_deref().ok_or(LineError::NotConfigured)
    }

    async fn post_messages(&self, path: &str, body: serde_json::Value) -> Result<(), LineError> {
        let url = format!("{}{}", self.api_base, path);
        let res = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingApi for LineClient {
    /// POST /message/reply
    async fn reply(&self, reply_token: &str, messages: &[Message]) -> Result<(), LineError> {
        let body = serde_json::json!({ "replyToken": reply_token, "messages": messages });
        self.post_messages("/message/reply", body).await
    }

    /// POST /message/push
    async fn push(&self, to: &str, messages: &[Message]) -> Result<(), LineError> {
        let body = serde_json::json!({ "to": to, "messages": messages });
        self.post_messages("/message/push", body).await
    }

    /// GET /profile/{userId}
    async fn profile(&self, user_id: &str) -> Result<Profile, LineError> {
        let url = format!("{}/profile/{}", self.api_base, user_id);
        let res = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LineError::Api(format!("{} {}", status, body)));
        }
        Ok(res.json().await?)
    }
}
