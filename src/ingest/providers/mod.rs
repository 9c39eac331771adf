// src/ingest/providers/mod.rs
pub mod accuweather;
pub mod http;
pub mod newsapi;
pub mod openweathermap;

use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::ingest::types::{NewsSource, WeatherSource};
use crate::model::WeatherProvider;

pub use accuweather::AccuWeatherClient;
pub use newsapi::NewsApiClient;
pub use openweathermap::OpenWeatherMapClient;

/// Build the configured weather source. Fails when its API key is missing.
pub fn weather_source_from_config(
    cfg: &AppConfig,
    http: &Client,
) -> Result<Arc<dyn WeatherSource>, AppError> {
    let id = cfg.weather_provider;
    let api_key = cfg.api_keys.weather_key(id).ok_or_else(|| {
        AppError::Config(format!(
            "No API key configured for weather provider '{id}'. \
             Hint: set {}_API_KEY.",
            id.as_str().to_ascii_uppercase()
        ))
    })?;

    let source: Arc<dyn WeatherSource> = match id {
        WeatherProvider::OpenWeatherMap => Arc::new(OpenWeatherMapClient::new(api_key, http.clone())),
        WeatherProvider::AccuWeather => Arc::new(AccuWeatherClient::new(api_key, http.clone())),
    };
    Ok(source)
}

pub fn news_source_from_config(
    cfg: &AppConfig,
    http: &Client,
) -> Result<Arc<dyn NewsSource>, AppError> {
    let api_key = cfg.api_keys.news_key().ok_or_else(|| {
        AppError::Config("No API key configured for NewsAPI. Hint: set NEWSAPI_API_KEY.".into())
    })?;
    Ok(Arc::new(NewsApiClient::new(api_key, http.clone())))
}
