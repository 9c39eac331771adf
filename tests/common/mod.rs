// tests/common/mod.rs
//
// Shared fixtures for the integration tests: sample records, in-memory
// repositories and scripted provider sources.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use weather_news_aggregator::error::AppError;
use weather_news_aggregator::ingest::types::{NewsSource, WeatherSource};
use weather_news_aggregator::model::{NewsArticle, WeatherObservation, WeatherProvider};
use weather_news_aggregator::repository::{BackendKind, Repositories, StorageConfig};

pub const BODY_LIMIT: usize = 1024 * 1024;

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn observation(city: &str, temperature: f64, timestamp: DateTime<Utc>) -> WeatherObservation {
    WeatherObservation {
        provider: WeatherProvider::OpenWeatherMap,
        city: city.to_string(),
        country: "VN".to_string(),
        latitude: 21.03,
        longitude: 105.85,
        temperature,
        feels_like: temperature + 1.0,
        temp_min: temperature - 1.0,
        temp_max: temperature + 2.0,
        humidity: 70,
        pressure: 1010,
        wind_speed: 2.5,
        wind_direction: 90,
        condition_main: "Clouds".to_string(),
        condition_description: "broken clouds".to_string(),
        condition_icon: "04d".to_string(),
        timestamp,
    }
}

pub fn article(slug: &str, title: &str, published_at: DateTime<Utc>) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        description: Some(format!("About {title}")),
        content: format!("Full story on {title}"),
        url: format!("https://news.example.test/{slug}"),
        image_url: None,
        published_at: Some(published_at),
        source_name: "Example Wire".to_string(),
        author: Some("Jane Roe".to_string()),
        provider: "newsapi".to_string(),
    }
}

pub async fn memory_repos(kind: BackendKind) -> Repositories {
    Repositories::connect(&StorageConfig::in_memory(kind))
        .await
        .expect("in-memory repositories")
}

/// OpenWeatherMap-shaped payload for `city`.
pub fn owm_payload(city: &str, temp: f64) -> Value {
    json!({
        "coord": {"lon": 105.85, "lat": 21.03},
        "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
        "main": {
            "temp": temp, "feels_like": temp, "temp_min": temp - 1.0, "temp_max": temp + 1.0,
            "pressure": 1009, "humidity": 65
        },
        "wind": {"speed": 2.0, "deg": 120},
        "dt": 1_709_287_200,
        "sys": {"country": "VN"},
        "name": city
    })
}

/// Answers every city from a fixed payload; cities listed in `failing` error
/// out and `delay` stalls every call.
pub struct ScriptedWeather {
    pub failing: Vec<String>,
    pub delay: Option<Duration>,
}

impl ScriptedWeather {
    pub fn healthy() -> Self {
        Self {
            failing: Vec::new(),
            delay: None,
        }
    }
}

#[async_trait]
impl WeatherSource for ScriptedWeather {
    fn provider(&self) -> WeatherProvider {
        WeatherProvider::OpenWeatherMap
    }

    async fn fetch_current(&self, city: &str) -> Result<Value, AppError> {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.failing.iter().any(|c| c == city) {
            return Err(AppError::upstream("openweathermap", "city not found"));
        }
        Ok(owm_payload(city, 28.0))
    }
}

pub struct ScriptedNews {
    pub payload: Value,
}

#[async_trait]
impl NewsSource for ScriptedNews {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_top_headlines(&self, _category: &str, _country: Option<&str>) -> Result<Value, AppError> {
        Ok(self.payload.clone())
    }
}

pub fn headlines(urls: &[&str]) -> Value {
    let articles: Vec<Value> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "source": {"id": null, "name": "Example Wire"},
                "author": "Jane Roe",
                "title": format!("Headline {i}"),
                "description": "Summary",
                "url": url,
                "urlToImage": null,
                "publishedAt": "2024-03-01T10:00:00Z",
                "content": "Body text"
            })
        })
        .collect();
    json!({"status": "ok", "totalResults": articles.len(), "articles": articles})
}

