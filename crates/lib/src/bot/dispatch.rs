//! Run a routed intent against the upstream services.

use crate::bot::compose;
use crate::bot::router::{route, Intent};
use crate::config::{self, Config};
use crate::line::{LineClient, LineError, Message, MessagingApi, WebhookBody, WebhookEvent};
use crate::llm::{CompletionApi, CompletionClient, CompletionError};
use crate::weather::{WeatherApi, WeatherClient, WeatherError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Line(#[from] LineError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Result of handling one webhook body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A reply was sent for the named intent.
    Replied(&'static str),
    /// Nothing matched; no outbound call was made.
    Ignored,
}

/// Owns the upstream clients. Cheap to share behind an `Arc`.
pub struct Dispatcher {
    line: Arc<dyn MessagingApi>,
    weather: Arc<dyn WeatherApi>,
    completion: Arc<dyn CompletionApi>,
}

impl Dispatcher {
    pub fn new(
        line: Arc<dyn MessagingApi>,
        weather: Arc<dyn WeatherApi>,
        completion: Arc<dyn CompletionApi>,
    ) -> Self {
        Self {
            line,
            weather,
            completion,
        }
    }

    /// Build HTTP clients from config. Missing secrets are logged here and surface as
    /// `NotConfigured` errors when the corresponding call is attempted.
    pub fn from_config(config: &Config) -> Self {
        let line_token = config::resolve_line_token(config);
        if line_token.is_none() {
            log::warn!("line channel access token not configured; replies will fail");
        }
        let weather_key = config::resolve_weather_api_key(config);
        if weather_key.is_none() {
            log::warn!("weather api key not configured; weather lookups will fail");
        }
        let completion_key = config::resolve_completion_api_key(config);
        if completion_key.is_none() {
            log::info!("completion api key not configured; `ask` replies will fail");
        }
        Self::new(
            Arc::new(LineClient::new(Some(config.line.api_base.clone()), line_token)),
            Arc::new(WeatherClient::new(
                Some(config.weather.base_url.clone()),
                Some(config.weather.api_host.clone()),
                weather_key,
            )),
            Arc::new(CompletionClient::new(
                Some(config.completion.base_url.clone()),
                completion_key,
                config.completion.model.clone(),
                config.completion.max_tokens,
            )),
        )
    }

    /// Dispatch the first event of a webhook body; other events are not handled.
    pub async fn handle_body(&self, body: &WebhookBody) -> Result<Outcome, DispatchError> {
        if body.events.len() > 1 {
            log::debug!("webhook carried {} events; only the first is handled", body.events.len());
        }
        match body.first_event() {
            Some(event) => self.handle_event(event).await,
            None => Ok(Outcome::Ignored),
        }
    }

    pub async fn handle_event(&self, event: &WebhookEvent) -> Result<Outcome, DispatchError> {
        let Some(routed) = route(event) else {
            log::debug!("no route for {:?} event", event.kind);
            return Ok(Outcome::Ignored);
        };
        let name = routed.intent.name();
        log::debug!("routing event to {}", name);
        let messages = self.compose(routed.intent).await?;
        self.line.reply(&routed.reply_token, &messages).await?;
        Ok(Outcome::Replied(name))
    }

    /// Perform any lookup the intent needs and build the reply messages.
    async fn compose(&self, intent: Intent) -> Result<Vec<Message>, DispatchError> {
        let message = match intent {
            Intent::Menu => compose::food_menu(),
            Intent::Choice(food) => compose::choice_reply(&food),
            Intent::WeatherPrompt => compose::weather_prompt(),
            Intent::Echo(text) => compose::echo_reply(&text),
            Intent::Profile(user_id) => {
                let profile = self.line.profile(&user_id).await?;
                compose::profile_card(&profile)
            }
            Intent::Ask(prompt) => {
                let answer = self.completion.complete(&prompt).await?;
                let answer = answer.trim();
                if answer.is_empty() {
                    compose::no_answer_reply()
                } else {
                    Message::text(answer)
                }
            }
            Intent::Weather {
                latitude,
                longitude,
            } => {
                let weather = self.weather.current(latitude, longitude).await?;
                compose::weather_report(&weather)
            }
        };
        Ok(vec![message])
    }

    /// Look up the weather at the given coordinates and push the report to `to`.
    /// Returns the pushed text.
    pub async fn push_weather(
        &self,
        to: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<String, DispatchError> {
        let weather = self.weather.current(latitude, longitude).await?;
        let report = weather.report();
        self.line.push(to, &[Message::text(report.clone())]).await?;
        log::info!("pushed weather report for {} to {}", weather.location.name, to);
        Ok(report)
    }
}
