//! Current-conditions lookup against weatherapi.com (through RapidAPI).

use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://weatherapi-com.p.rapidapi.com";
pub const DEFAULT_API_HOST: &str = "weatherapi-com.p.rapidapi.com";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather api error: {0}")]
    Api(String),
    #[error("weather api key not configured")]
    NotConfigured,
}

/// Response of GET /current.json (only the fields we report).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub location: WeatherLocation,
    pub current: Conditions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherLocation {
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conditions {
    pub last_updated: String,
    pub temp_c: f64,
}

impl CurrentWeather {
    /// Plain-text report sent to the user.
    pub fn report(&self) -> String {
        format!(
            "Report Now!\n\n- location: {}\n- region: {}\n- last_updated: {}\n- temp_c: {} (° C)",
            self.location.name, self.location.region, self.current.last_updated, self.current.temp_c
        )
    }
}

#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, WeatherError>;
}

#[derive(Clone)]
pub struct WeatherClient {
    base_url: String,
    api_host: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: Option<String>, api_host: Option<String>, api_key: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_host: api_host.unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl WeatherApi for WeatherClient {
    /// GET /current.json?q={lat},{lon}
    async fn current(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, WeatherError> {
        let key = self.api_key.as_deref().ok_or(WeatherError::NotConfigured)?;
        let url = format!("{}/current.json", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[("q", format!("{},{}", latitude, longitude))])
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(WeatherError::Api(format!("{} {}", status, body)));
        }
        Ok(res.json().await?)
    }
}
