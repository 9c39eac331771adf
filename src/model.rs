// src/model.rs
//! Normalized record shapes shared by transformers, repositories and the API.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_NEWS_PROVIDER: &str = "newsapi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherProvider {
    OpenWeatherMap,
    AccuWeather,
}

impl WeatherProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherProvider::OpenWeatherMap => "openweathermap",
            WeatherProvider::AccuWeather => "accuweather",
        }
    }

    pub const fn all() -> &'static [WeatherProvider] {
        &[WeatherProvider::OpenWeatherMap, WeatherProvider::AccuWeather]
    }
}

impl fmt::Display for WeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherProvider {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openweathermap" | "openweather" | "owm" => Ok(WeatherProvider::OpenWeatherMap),
            "accuweather" => Ok(WeatherProvider::AccuWeather),
            _ => Err(AppError::Config(format!(
                "Unknown weather provider '{value}'. Supported providers: openweathermap, accuweather."
            ))),
        }
    }
}

/// A weather reading after normalization, before it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    pub provider: WeatherProvider,
    pub city: String,
    /// ISO-3166 alpha-2 where the input could be mapped.
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// °C
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Percent, 0–100.
    pub humidity: i64,
    /// hPa
    pub pressure: i64,
    /// m/s
    pub wind_speed: f64,
    /// Degrees, 0–360.
    pub wind_direction: i64,
    pub condition_main: String,
    pub condition_description: String,
    pub condition_icon: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub id: i64,
    #[serde(flatten)]
    pub observation: WeatherObservation,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A news article after normalization, before it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    /// Natural dedup key.
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub author: Option<String>,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub id: i64,
    #[serde(flatten)]
    pub article: NewsArticle,
    pub created_at: DateTime<Utc>,
}
