// src/transform/accuweather.rs
//! AccuWeather current conditions.
//!
//! AccuWeather needs a location lookup before the conditions call, so the
//! client hands this transformer `{"location": <city search hit>,
//! "conditions": <current conditions>}`. `conditions` may be the raw array the
//! API returns or its first element.

use serde::Deserialize;
use serde_json::Value;

use super::units::{fahrenheit_to_celsius, inhg_to_hpa, kmh_to_mps, mph_to_mps, round_to};
use super::{decode, has_paths, location, unix_to_utc, Transformer};
use crate::error::ValidationError;
use crate::model::{WeatherObservation, WeatherProvider};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuLocation {
    localized_name: String,
    country: AccuCountry,
    geo_position: AccuGeo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuCountry {
    #[serde(rename = "ID")]
    id: Option<String>,
    localized_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuGeo {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuConditions {
    epoch_time: i64,
    weather_text: String,
    weather_icon: Option<u32>,
    temperature: AccuMeasure,
    real_feel_temperature: Option<AccuMeasure>,
    relative_humidity: Option<f64>,
    wind: Option<AccuWind>,
    pressure: Option<AccuMeasure>,
    temperature_summary: Option<AccuTemperatureSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuMeasure {
    metric: Option<AccuValue>,
    imperial: Option<AccuValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuWind {
    direction: Option<AccuDirection>,
    #[serde(default)]
    speed: AccuMeasure,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuDirection {
    degrees: f64,
}

#[derive(Debug, Deserialize)]
struct AccuTemperatureSummary {
    #[serde(rename = "Past24HourRange")]
    past_24_hour_range: Option<AccuRange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccuRange {
    minimum: AccuMeasure,
    maximum: AccuMeasure,
}

impl AccuMeasure {
    /// Metric °C, falling back to Imperial °F.
    fn celsius(&self) -> Option<f64> {
        if let Some(m) = &self.metric {
            return Some(m.value);
        }
        self.imperial
            .as_ref()
            .map(|i| round_to(fahrenheit_to_celsius(i.value), 2))
    }

    /// Metric km/h, falling back to Imperial mph; both end up in m/s.
    fn meters_per_second(&self) -> Option<f64> {
        if let Some(m) = &self.metric {
            return Some(round_to(kmh_to_mps(m.value), 2));
        }
        self.imperial
            .as_ref()
            .map(|i| round_to(mph_to_mps(i.value), 2))
    }

    /// Imperial inHg converted to hPa, falling back to Metric mb.
    fn hectopascals(&self) -> Option<i64> {
        if let Some(i) = &self.imperial {
            return Some(inhg_to_hpa(i.value));
        }
        self.metric.as_ref().map(|m| m.value.round() as i64)
    }
}

fn conditions_of(raw: &Value) -> Option<&Value> {
    match raw.get("conditions")? {
        Value::Array(items) => items.first(),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AccuWeatherTransformer;

impl Transformer for AccuWeatherTransformer {
    type Output = WeatherObservation;

    fn provider(&self) -> &'static str {
        WeatherProvider::AccuWeather.as_str()
    }

    fn validate(&self, raw: &Value) -> bool {
        let location_ok = has_paths(
            raw,
            &[
                "/location/LocalizedName",
                "/location/Country",
                "/location/GeoPosition/Latitude",
                "/location/GeoPosition/Longitude",
            ],
        );
        let Some(conditions) = conditions_of(raw) else {
            return false;
        };
        let has_temperature = has_paths(conditions, &["/Temperature/Metric/Value"])
            || has_paths(conditions, &["/Temperature/Imperial/Value"]);
        location_ok && has_temperature && has_paths(conditions, &["/EpochTime", "/WeatherText"])
    }

    fn transform(&self, raw: &Value) -> Result<WeatherObservation, ValidationError> {
        let location: AccuLocation = decode(self.provider(), &raw["location"])?;
        let conditions_raw = conditions_of(raw)
            .ok_or_else(|| ValidationError::single("conditions", "conditions are missing"))?;
        let c: AccuConditions = decode(self.provider(), conditions_raw)?;

        let temperature = c
            .temperature
            .celsius()
            .ok_or_else(|| ValidationError::single("temperature", "temperature is required"))?;
        let feels_like = c
            .real_feel_temperature
            .as_ref()
            .and_then(AccuMeasure::celsius)
            .unwrap_or(temperature);
        let range = c
            .temperature_summary
            .as_ref()
            .and_then(|s| s.past_24_hour_range.as_ref());
        let temp_min = range
            .and_then(|r| r.minimum.celsius())
            .unwrap_or(temperature);
        let temp_max = range
            .and_then(|r| r.maximum.celsius())
            .unwrap_or(temperature);

        let (wind_speed, wind_direction) = match &c.wind {
            Some(w) => (
                w.speed.meters_per_second().unwrap_or(0.0),
                w.direction.as_ref().map(|d| d.degrees.round() as i64).unwrap_or(0),
            ),
            None => (0.0, 0),
        };

        let country_raw = location
            .country
            .id
            .as_deref()
            .or(location.country.localized_name.as_deref())
            .unwrap_or_default();

        Ok(WeatherObservation {
            provider: WeatherProvider::AccuWeather,
            city: location::normalize_city(&location.localized_name),
            country: location::normalize_country(country_raw),
            latitude: location.geo_position.latitude,
            longitude: location.geo_position.longitude,
            temperature,
            feels_like,
            temp_min,
            temp_max,
            humidity: c.relative_humidity.unwrap_or(0.0).round() as i64,
            pressure: c
                .pressure
                .as_ref()
                .and_then(AccuMeasure::hectopascals)
                .unwrap_or(0),
            wind_speed,
            wind_direction,
            condition_main: c.weather_text.clone(),
            condition_description: c.weather_text,
            condition_icon: c
                .weather_icon
                .map(|i| format!("{i:02}"))
                .unwrap_or_default(),
            timestamp: unix_to_utc(c.epoch_time)?,
        })
    }
}
