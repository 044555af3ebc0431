//! Inbound webhook payload (POST body from the LINE platform).

use serde::Deserialize;

/// Webhook request body. Only `events` is used for dispatch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

impl WebhookBody {
    /// First event, the only one that is dispatched.
    pub fn first_event(&self) -> Option<&WebhookEvent> {
        self.events.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Message,
    Postback,
    /// follow, unfollow, join, beacon, ...
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

impl WebhookEvent {
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.user_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Location,
    /// image, video, sticker, ...
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub data: String,
}
