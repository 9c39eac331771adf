// src/transform/mod.rs
//! Provider transformers: map each provider's raw JSON onto the internal
//! record shapes in [`crate::model`].

pub mod accuweather;
pub mod location;
pub mod newsapi;
pub mod openweathermap;
pub mod units;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ValidationError;
use crate::model::{WeatherObservation, WeatherProvider};

pub use accuweather::AccuWeatherTransformer;
pub use newsapi::NewsApiTransformer;
pub use openweathermap::OpenWeatherMapTransformer;

pub trait Transformer {
    type Output;

    fn provider(&self) -> &'static str;

    /// Cheap structural check: are the nested fields `transform` relies on present?
    fn validate(&self, raw: &Value) -> bool;

    fn transform(&self, raw: &Value) -> Result<Self::Output, ValidationError>;

    /// `validate`, then `transform`.
    fn normalize(&self, raw: &Value) -> Result<Self::Output, ValidationError> {
        if !self.validate(raw) {
            return Err(ValidationError::single(
                "payload",
                format!("unexpected {} response shape", self.provider()),
            ));
        }
        self.transform(raw)
    }
}

/// Normalize a current-weather payload with the transformer for `provider`.
pub fn normalize_weather(
    provider: WeatherProvider,
    raw: &Value,
) -> Result<WeatherObservation, ValidationError> {
    match provider {
        WeatherProvider::OpenWeatherMap => OpenWeatherMapTransformer.normalize(raw),
        WeatherProvider::AccuWeather => AccuWeatherTransformer.normalize(raw),
    }
}

/// True when every JSON pointer resolves to a non-null value.
pub(crate) fn has_paths(raw: &Value, paths: &[&str]) -> bool {
    paths
        .iter()
        .all(|p| raw.pointer(p).is_some_and(|v| !v.is_null()))
}

pub(crate) fn decode<T: DeserializeOwned>(
    provider: &str,
    raw: &Value,
) -> Result<T, ValidationError> {
    T::deserialize(raw)
        .map_err(|e| ValidationError::single("payload", format!("invalid {provider} payload: {e}")))
}

pub(crate) fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| ValidationError::single("timestamp", format!("epoch {ts} is out of range")))
}
