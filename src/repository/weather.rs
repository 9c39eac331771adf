// src/repository/weather.rs
//! Weather observations: table mapping, filter schema and write-time checks.

use chrono::{Duration, Utc};

use super::backend::RowReader;
use super::entity::Entity;
use crate::error::{StoreError, ValidationError};
use crate::model::{WeatherObservation, WeatherProvider, WeatherRecord};
use crate::query::{verbatim, Column, EntitySchema, FieldKind, FilterField, Operator, SqlValue};

pub const TEMPERATURE_RANGE: (f64, f64) = (-100.0, 70.0);
pub const PRESSURE_RANGE: (i64, i64) = (800, 1200);
pub const MAX_WIND_SPEED: f64 = 150.0;
pub const MAX_FUTURE_SKEW_HOURS: i64 = 24;

const PROVIDERS: &[&str] = &["openweathermap", "accuweather"];

const COLUMNS: &[Column] = &[
    Column { name: "id", sql: "id", kind: FieldKind::Integer },
    Column { name: "provider", sql: "provider", kind: FieldKind::Text },
    Column { name: "city", sql: "city", kind: FieldKind::Text },
    Column { name: "country", sql: "country", kind: FieldKind::Text },
    Column { name: "latitude", sql: "latitude", kind: FieldKind::Number },
    Column { name: "longitude", sql: "longitude", kind: FieldKind::Number },
    Column { name: "temperature", sql: "temperature", kind: FieldKind::Number },
    Column { name: "feelsLike", sql: "feels_like", kind: FieldKind::Number },
    Column { name: "tempMin", sql: "temp_min", kind: FieldKind::Number },
    Column { name: "tempMax", sql: "temp_max", kind: FieldKind::Number },
    Column { name: "humidity", sql: "humidity", kind: FieldKind::Integer },
    Column { name: "pressure", sql: "pressure", kind: FieldKind::Integer },
    Column { name: "windSpeed", sql: "wind_speed", kind: FieldKind::Number },
    Column { name: "windDirection", sql: "wind_direction", kind: FieldKind::Integer },
    Column { name: "conditionMain", sql: "condition_main", kind: FieldKind::Text },
    Column { name: "conditionDescription", sql: "condition_description", kind: FieldKind::Text },
    Column { name: "conditionIcon", sql: "condition_icon", kind: FieldKind::Text },
    Column { name: "timestamp", sql: "timestamp", kind: FieldKind::Date },
    Column { name: "createdAt", sql: "created_at", kind: FieldKind::Date },
    Column { name: "updatedAt", sql: "updated_at", kind: FieldKind::Date },
];

const FILTERS: &[FilterField] = &[
    FilterField::new("city", &["city"], FieldKind::Text, Operator::IContains),
    FilterField::new("country", &["country"], FieldKind::Text, Operator::IExact),
    FilterField::new("provider", &["provider"], FieldKind::Text, Operator::IExact).allowed(PROVIDERS),
    FilterField::new("minTemperature", &["temperature"], FieldKind::Number, Operator::Gte),
    FilterField::new("maxTemperature", &["temperature"], FieldKind::Number, Operator::Lte),
    FilterField::new("fromDate", &["timestamp"], FieldKind::Date, Operator::Gte),
    FilterField::new("toDate", &["timestamp"], FieldKind::Date, Operator::Lte),
];

pub static WEATHER_SCHEMA: EntitySchema = EntitySchema {
    entity: "weather",
    columns: COLUMNS,
    filters: FILTERS,
    default_sort: ("timestamp", true),
    stored_text: verbatim,
};

fn check_range<T: PartialOrd + std::fmt::Display + Copy>(
    errors: &mut ValidationError,
    field: &str,
    value: T,
    min: T,
    max: T,
) {
    if value < min || value > max {
        errors.push(field, format!("{field} must be between {min} and {max}"));
    }
}

fn check_finite(errors: &mut ValidationError, field: &str, value: f64) -> bool {
    if value.is_finite() {
        true
    } else {
        errors.push(field, format!("{field} must be a finite number"));
        false
    }
}

/// Write-time checks for a weather observation. Every problem is reported, not
/// just the first.
pub fn validate_observation(o: &WeatherObservation) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();

    for (field, value) in [
        ("city", &o.city),
        ("country", &o.country),
        ("conditionMain", &o.condition_main),
        ("conditionDescription", &o.condition_description),
        ("conditionIcon", &o.condition_icon),
    ] {
        if value.trim().is_empty() {
            errors.missing(field);
        }
    }

    let (t_min, t_max) = TEMPERATURE_RANGE;
    for (field, value) in [
        ("temperature", o.temperature),
        ("feelsLike", o.feels_like),
        ("tempMin", o.temp_min),
        ("tempMax", o.temp_max),
    ] {
        if check_finite(&mut errors, field, value) {
            check_range(&mut errors, field, value, t_min, t_max);
        }
    }

    if check_finite(&mut errors, "latitude", o.latitude) {
        check_range(&mut errors, "latitude", o.latitude, -90.0, 90.0);
    }
    if check_finite(&mut errors, "longitude", o.longitude) {
        check_range(&mut errors, "longitude", o.longitude, -180.0, 180.0);
    }
    check_range(&mut errors, "humidity", o.humidity, 0, 100);
    check_range(&mut errors, "pressure", o.pressure, PRESSURE_RANGE.0, PRESSURE_RANGE.1);
    if check_finite(&mut errors, "windSpeed", o.wind_speed) {
        check_range(&mut errors, "windSpeed", o.wind_speed, 0.0, MAX_WIND_SPEED);
    }
    check_range(&mut errors, "windDirection", o.wind_direction, 0, 360);

    if o.timestamp > Utc::now() + Duration::hours(MAX_FUTURE_SKEW_HOURS) {
        errors.push(
            "timestamp",
            format!("timestamp must not be more than {MAX_FUTURE_SKEW_HOURS}h in the future"),
        );
    }

    errors.into_result()
}

impl Entity for WeatherRecord {
    type Draft = WeatherObservation;

    const NAME: &'static str = "weather";
    const TABLE: &'static str = "weather";
    const COLUMNS: &'static [&'static str] = &[
        "provider",
        "city",
        "country",
        "latitude",
        "longitude",
        "temperature",
        "feels_like",
        "temp_min",
        "temp_max",
        "humidity",
        "pressure",
        "wind_speed",
        "wind_direction",
        "condition_main",
        "condition_description",
        "condition_icon",
        "timestamp",
    ];
    const HAS_UPDATED_AT: bool = true;
    const REQUIRED: &'static [&'static str] = &[
        "provider",
        "city",
        "country",
        "latitude",
        "longitude",
        "temperature",
        "feelsLike",
        "tempMin",
        "tempMax",
        "humidity",
        "pressure",
        "windSpeed",
        "windDirection",
        "conditionMain",
        "conditionDescription",
        "conditionIcon",
        "timestamp",
    ];

    fn schema() -> &'static EntitySchema {
        &WEATHER_SCHEMA
    }

    fn prepare(mut o: WeatherObservation) -> WeatherObservation {
        for s in [
            &mut o.city,
            &mut o.country,
            &mut o.condition_main,
            &mut o.condition_description,
            &mut o.condition_icon,
        ] {
            *s = s.trim().to_string();
        }
        o
    }

    fn validate(draft: &WeatherObservation) -> Result<(), ValidationError> {
        validate_observation(draft)
    }

    fn bind(o: &WeatherObservation) -> Vec<SqlValue> {
        vec![
            o.provider.as_str().into(),
            o.city.as_str().into(),
            o.country.as_str().into(),
            o.latitude.into(),
            o.longitude.into(),
            o.temperature.into(),
            o.feels_like.into(),
            o.temp_min.into(),
            o.temp_max.into(),
            o.humidity.into(),
            o.pressure.into(),
            o.wind_speed.into(),
            o.wind_direction.into(),
            o.condition_main.as_str().into(),
            o.condition_description.as_str().into(),
            o.condition_icon.as_str().into(),
            o.timestamp.timestamp().into(),
        ]
    }

    fn from_row(r: &mut RowReader) -> Result<Self, StoreError> {
        let id = r.int()?;
        let provider = r
            .text()?
            .parse::<WeatherProvider>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let observation = WeatherObservation {
            provider,
            city: r.text()?,
            country: r.text()?,
            latitude: r.real()?,
            longitude: r.real()?,
            temperature: r.real()?,
            feels_like: r.real()?,
            temp_min: r.real()?,
            temp_max: r.real()?,
            humidity: r.int()?,
            pressure: r.int()?,
            wind_speed: r.real()?,
            wind_direction: r.int()?,
            condition_main: r.text()?,
            condition_description: r.text()?,
            condition_icon: r.text()?,
            timestamp: r.timestamp()?,
        };
        Ok(WeatherRecord {
            id,
            observation,
            created_at: r.timestamp()?,
            updated_at: r.timestamp()?,
        })
    }
}
