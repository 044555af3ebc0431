//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.linebot/config.json`) and environment.
//! Secrets (channel access token, API keys) may come from either; a non-empty env value wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// LINE Messaging API settings.
    #[serde(default)]
    pub line: LineConfig,

    /// Weather lookup (weatherapi.com via RapidAPI).
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Text completion (OpenAI-compatible chat completions).
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Target and coordinates for the weather push trigger.
    #[serde(default)]
    pub push: PushConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Long-lived channel access token. Overridden by LINE_CHANNEL_ACCESS_TOKEN env when set.
    pub channel_access_token: Option<String>,
    /// Messaging API base (default https://api.line.me/v2/bot).
    #[serde(default = "default_line_api_base")]
    pub api_base: String,
}

fn default_line_api_base() -> String {
    crate::line::DEFAULT_API_BASE.to_string()
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            api_base: default_line_api_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConfig {
    /// RapidAPI key. Overridden by WEATHER_API_KEY env when set.
    pub api_key: Option<String>,
    /// Value sent as X-RapidAPI-Host.
    #[serde(default = "default_weather_api_host")]
    pub api_host: String,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

fn default_weather_api_host() -> String {
    crate::weather::DEFAULT_API_HOST.to_string()
}

fn default_weather_base_url() -> String {
    crate::weather::DEFAULT_BASE_URL.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_host: default_weather_api_host(),
            base_url: default_weather_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    /// Bearer key. Overridden by COMPLETION_API_KEY env when set.
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL; `/chat/completions` is appended.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,
}

fn default_completion_base_url() -> String {
    crate::llm::DEFAULT_BASE_URL.to_string()
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_completion_max_tokens() -> u32 {
    256
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            max_tokens: default_completion_max_tokens(),
        }
    }
}

/// Weather push: who receives it and where to look up the weather.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushConfig {
    /// LINE user id that receives pushed reports. Push is rejected when unset.
    pub to: Option<String>,
    #[serde(default = "default_push_latitude")]
    pub latitude: f64,
    #[serde(default = "default_push_longitude")]
    pub longitude: f64,
}

fn default_push_latitude() -> f64 {
    13.819314097361195
}

fn default_push_longitude() -> f64 {
    100.51429852634443
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            to: None,
            latitude: default_push_latitude(),
            longitude: default_push_longitude(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Non-empty trimmed value of `name` from `lookup`, else the non-empty trimmed file value.
fn resolve_secret(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    file_value: &Option<String>,
) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| config_secret(file_value))
}

fn config_secret(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the LINE channel access token: env LINE_CHANNEL_ACCESS_TOKEN overrides config.
pub fn resolve_line_token(config: &Config) -> Option<String> {
    resolve_secret(env_var, "LINE_CHANNEL_ACCESS_TOKEN", &config.line.channel_access_token)
}

/// Resolve the RapidAPI key: env WEATHER_API_KEY overrides config.
pub fn resolve_weather_api_key(config: &Config) -> Option<String> {
    resolve_secret(env_var, "WEATHER_API_KEY", &config.weather.api_key)
}

/// Resolve the completion API key: env COMPLETION_API_KEY overrides config.
pub fn resolve_completion_api_key(config: &Config) -> Option<String> {
    resolve_secret(env_var, "COMPLETION_API_KEY", &config.completion.api_key)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("LINEBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".linebot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or LINEBOT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = read_config(&path)?;
    Ok((config, path))
}

fn read_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}
