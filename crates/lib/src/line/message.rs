//! Outbound message objects, serialized exactly as the Messaging API expects them.

use serde::Serialize;

/// One message in a reply or push request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        /// Bubble or carousel container.
        contents: serde_json::Value,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: None,
        }
    }

    pub fn text_with_quick_reply(text: impl Into<String>, items: Vec<QuickReplyItem>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: Some(QuickReply { items }),
        }
    }

    pub fn flex(alt_text: impl Into<String>, contents: serde_json::Value) -> Self {
        Message::Flex {
            alt_text: alt_text.into(),
            contents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReplyItem {
    /// Always "action".
    #[serde(rename = "type")]
    pub typ: &'static str,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub action: Action,
}

impl QuickReplyItem {
    pub fn new(action: Action) -> Self {
        Self {
            typ: "action",
            image_url: None,
            action,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    /// Sends `text` back as a user message when tapped.
    Message { label: String, text: String },
    /// Opens the location picker.
    Location { label: String },
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText", skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
}
