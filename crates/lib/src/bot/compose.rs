//! Reply payloads for each intent.

use crate::line::{Action, Message, Profile, QuickReplyItem};
use crate::weather::CurrentWeather;
use serde_json::json;

/// Food options offered in the menu: (label, quick-reply image).
pub const FOODS: &[(&str, &str)] = &[
    ("Sushi", "https://example.com/sushi.png"),
    ("Tempura", "https://example.com/tempura.png"),
];

pub const NO_ANSWER: &str = "Sorry, I have no answer for that.";

const MENU_TEXT: &str = "Select your favorite food category or send me your location!";
const WEATHER_PROMPT_TEXT: &str = "Send me your location to get the current weather!";
const SEND_LOCATION_LABEL: &str = "Send location";

fn send_location_item() -> QuickReplyItem {
    QuickReplyItem::new(Action::Location {
        label: SEND_LOCATION_LABEL.to_string(),
    })
}

/// Text with one message-action item per food, then a location item.
pub fn food_menu() -> Message {
    let mut items: Vec<QuickReplyItem> = FOODS
        .iter()
        .map(|(food, image)| {
            QuickReplyItem::new(Action::Message {
                label: food.to_string(),
                text: food.to_string(),
            })
            .with_image(*image)
        })
        .collect();
    items.push(send_location_item());
    Message::text_with_quick_reply(MENU_TEXT, items)
}

pub fn choice_reply(food: &str) -> Message {
    Message::text(format!(
        "{}? Great choice! Send me your location and I'll check the weather before you head out.",
        food
    ))
}

pub fn weather_prompt() -> Message {
    Message::text_with_quick_reply(WEATHER_PROMPT_TEXT, vec![send_location_item()])
}

pub fn weather_report(weather: &CurrentWeather) -> Message {
    Message::text(weather.report())
}

pub fn echo_reply(text: &str) -> Message {
    Message::text(text)
}

pub fn no_answer_reply() -> Message {
    Message::text(NO_ANSWER)
}

/// Flex bubble: optional hero picture, name, optional status, and postback buttons.
pub fn profile_card(profile: &Profile) -> Message {
    let mut body = vec![json!({
        "type": "text",
        "text": profile.display_name,
        "weight": "bold",
        "size": "xl",
        "wrap": true
    })];
    if let Some(status) = profile.status_message.as_deref().filter(|s| !s.is_empty()) {
        body.push(json!({
            "type": "text",
            "text": status,
            "size": "sm",
            "color": "#999999",
            "wrap": true
        }));
    }

    let mut bubble = json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": body
        },
        "footer": {
            "type": "box",
            "layout": "horizontal",
            "spacing": "sm",
            "contents": [
                postback_button("Weather", "action=weather"),
                postback_button("Menu", "action=menu")
            ]
        }
    });
    if let Some(url) = profile.picture_url.as_deref().filter(|s| !s.is_empty()) {
        bubble["hero"] = json!({
            "type": "image",
            "url": url,
            "size": "full",
            "aspectRatio": "1:1",
            "aspectMode": "cover"
        });
    }

    Message::flex(format!("Profile of {}", profile.display_name), bubble)
}

fn postback_button(label: &str, data: &str) -> serde_json::Value {
    let action = Action::Postback {
        label: label.to_string(),
        data: data.to_string(),
        display_text: Some(label.to_string()),
    };
    json!({
        "type": "button",
        "style": "primary",
        "height": "sm",
        "action": action
    })
}
