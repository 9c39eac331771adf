// src/ingest/providers/accuweather.rs
//! AccuWeather needs two calls per city: a text search for the location key,
//! then current conditions for that key. Both responses are handed on together.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::http::get_json;
use crate::error::AppError;
use crate::ingest::types::WeatherSource;
use crate::model::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://dataservice.accuweather.com";

pub struct AccuWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AccuWeatherClient {
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

    async fn search_location(&self, city: &str) -> Result<Value, AppError> {
        let request = self
            .http
            .get(format!("{}/locations/v1/cities/search", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("q", city)]);
        let hits = get_json(self.provider().as_str(), request).await?;
        hits.as_array()
            .and_then(|a| a.first())
            .cloned()
            .ok_or_else(|| AppError::upstream(self.provider(), format!("no location found for '{city}'")))
    }
}

#[async_trait]
impl WeatherSource for AccuWeatherClient {
    fn provider(&self) -> WeatherProvider {
        WeatherProvider::AccuWeather
    }

    async fn fetch_current(&self, city: &str) -> Result<Value, AppError> {
        let location = self.search_location(city).await?;
        let key = location
            .get("Key")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::upstream(self.provider(), "location result has no Key"))?
            .to_string();

        let request = self
            .http
            .get(format!("{}/currentconditions/v1/{key}", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("details", "true")]);
        let conditions = get_json(self.provider().as_str(), request).await?;

        Ok(json!({ "location": location, "conditions": conditions }))
    }
}
