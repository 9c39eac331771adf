// src/ingest/providers/openweathermap.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::get_json;
use crate::error::AppError;
use crate::ingest::types::WeatherSource;
use crate::model::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherMapClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherMapClient {
    pub fn new(api_key: impl Into<String>, http: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMapClient {
    fn provider(&self) -> WeatherProvider {
        WeatherProvider::OpenWeatherMap
    }

    async fn fetch_current(&self, city: &str) -> Result<Value, AppError> {
        let request = self
            .http
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ]);
        get_json(WeatherProvider::OpenWeatherMap.as_str(), request).await
    }
}
