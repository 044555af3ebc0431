//! Map an inbound event to an intent. Matching is case-sensitive (exact or prefix).

use crate::bot::compose::FOODS;
use crate::line::{EventType, MessageType, WebhookEvent};

const ASK_PREFIX: &str = "ask ";
const ECHO_PREFIX: &str = "echo ";

/// What the bot should do for a matched event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Food quick-reply menu.
    Menu,
    /// User picked a food from the menu.
    Choice(String),
    /// Ask the user to share a location.
    WeatherPrompt,
    /// Flex card for this user id.
    Profile(String),
    /// Forward the prompt to the completion service.
    Ask(String),
    Echo(String),
    /// Weather lookup at the shared location.
    Weather { latitude: f64, longitude: f64 },
}

impl Intent {
    /// Short name used in logs and webhook responses.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Menu => "menu",
            Intent::Choice(_) => "choice",
            Intent::WeatherPrompt => "weather_prompt",
            Intent::Profile(_) => "profile",
            Intent::Ask(_) => "ask",
            Intent::Echo(_) => "echo",
            Intent::Weather { .. } => "weather",
        }
    }
}

/// Matched event: the reply token to answer with and the intent.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub reply_token: String,
    pub intent: Intent,
}

/// Route one event. `None` means no outbound call should be made.
pub fn route(event: &WebhookEvent) -> Option<Routed> {
    let reply_token = event.reply_token.as_deref().filter(|t| !t.is_empty())?;
    let intent = match event.kind {
        EventType::Message => message_intent(event)?,
        EventType::Postback => postback_intent(event)?,
        EventType::Other => return None,
    };
    Some(Routed {
        reply_token: reply_token.to_string(),
        intent,
    })
}

fn message_intent(event: &WebhookEvent) -> Option<Intent> {
    let message = event.message.as_ref()?;
    match message.kind {
        MessageType::Text => text_intent(event, message.text.as_deref()?),
        MessageType::Location => Some(Intent::Weather {
            latitude: message.latitude?,
            longitude: message.longitude?,
        }),
        MessageType::Other => None,
    }
}

fn text_intent(event: &WebhookEvent, text: &str) -> Option<Intent> {
    match text {
        "menu" => return Some(Intent::Menu),
        "weather" => return Some(Intent::WeatherPrompt),
        "profile" => return event.user_id().map(|u| Intent::Profile(u.to_string())),
        _ => {}
    }
    if FOODS.iter().any(|(food, _)| *food == text) {
        return Some(Intent::Choice(text.to_string()));
    }
    if let Some(rest) = prefixed(text, ASK_PREFIX) {
        return Some(Intent::Ask(rest.to_string()));
    }
    if let Some(rest) = prefixed(text, ECHO_PREFIX) {
        return Some(Intent::Echo(rest.to_string()));
    }
    None
}

/// Trimmed remainder after `prefix`, if non-empty.
fn prefixed<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)
        .map(str::trim)
        .filter(|rest| !rest.is_empty())
}

fn postback_intent(event: &WebhookEvent) -> Option<Intent> {
    match event.postback.as_ref()?.data.as_str() {
        "action=menu" => Some(Intent::Menu),
        "action=weather" => Some(Intent::WeatherPrompt),
        "action=profile" => event.user_id().map(|u| Intent::Profile(u.to_string())),
        _ => None,
    }
}
