// src/transform/openweathermap.rs
//! OpenWeatherMap "current weather" (`/data/2.5/weather`, `units=metric`).

use serde::Deserialize;
use serde_json::Value;

use super::{decode, has_paths, location, unix_to_utc, Transformer};
use crate::error::ValidationError;
use crate::model::{WeatherObservation, WeatherProvider};

const REQUIRED_PATHS: &[&str] = &[
    "/name",
    "/dt",
    "/coord/lat",
    "/coord/lon",
    "/main/temp",
    "/main/humidity",
    "/main/pressure",
    "/wind/speed",
    "/weather/0",
];

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    name: String,
    dt: i64,
    coord: OwmCoord,
    main: OwmMain,
    wind: OwmWind,
    weather: Vec<OwmCondition>,
    #[serde(default)]
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenWeatherMapTransformer;

impl Transformer for OpenWeatherMapTransformer {
    type Output = WeatherObservation;

    fn provider(&self) -> &'static str {
        WeatherProvider::OpenWeatherMap.as_str()
    }

    fn validate(&self, raw: &Value) -> bool {
        has_paths(raw, REQUIRED_PATHS)
    }

    fn transform(&self, raw: &Value) -> Result<WeatherObservation, ValidationError> {
        let parsed: OwmCurrent = decode(self.provider(), raw)?;
        let condition = parsed
            .weather
            .first()
            .ok_or_else(|| ValidationError::single("weather", "weather[0] is missing"))?;

        Ok(WeatherObservation {
            provider: WeatherProvider::OpenWeatherMap,
            city: location::normalize_city(&parsed.name),
            country: location::normalize_country(&parsed.sys.country),
            latitude: parsed.coord.lat,
            longitude: parsed.coord.lon,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like.unwrap_or(parsed.main.temp),
            temp_min: parsed.main.temp_min.unwrap_or(parsed.main.temp),
            temp_max: parsed.main.temp_max.unwrap_or(parsed.main.temp),
            humidity: parsed.main.humidity.round() as i64,
            pressure: parsed.main.pressure.round() as i64,
            wind_speed: parsed.wind.speed,
            wind_direction: parsed.wind.deg.round() as i64,
            condition_main: condition.main.clone(),
            condition_description: condition.description.clone(),
            condition_icon: condition.icon.clone(),
            timestamp: unix_to_utc(parsed.dt)?,
        })
    }
}
