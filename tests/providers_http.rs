// tests/providers_http.rs
//
// Provider clients against a local stand-in for the upstream APIs.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use common::owm_payload;
use weather_news_aggregator::error::AppError;
use weather_news_aggregator::ingest::providers::http::build_client;
use weather_news_aggregator::ingest::providers::{AccuWeatherClient, NewsApiClient, OpenWeatherMapClient};
use weather_news_aggregator::ingest::types::{NewsSource, WeatherSource};
use weather_news_aggregator::model::WeatherProvider;
use weather_news_aggregator::transform::normalize_weather;

type Q = Query<HashMap<String, String>>;

async fn owm_weather(Query(q): Q) -> Result<Json<Value>, (StatusCode, String)> {
    if q.get("appid").map(String::as_str) != Some("good-key") {
        return Err((StatusCode::UNAUTHORIZED, r#"{"cod":401,"message":"Invalid API key"}"#.into()));
    }
    assert_eq!(q.get("units").map(String::as_str), Some("metric"));
    let city = q.get("q").cloned().unwrap_or_default();
    Ok(Json(owm_payload(&city, 30.5)))
}

async fn accu_search(Query(q): Q) -> Json<Value> {
    if q.get("q").map(String::as_str) == Some("Nowhere") {
        return Json(json!([]));
    }
    Json(json!([{
        "Key": "353412",
        "LocalizedName": "Hanoi",
        "Country": {"ID": "VN", "LocalizedName": "Vietnam"},
        "GeoPosition": {"Latitude": 21.03, "Longitude": 105.85}
    }]))
}

async fn accu_current(Path(key): Path<String>, Query(q): Q) -> Json<Value> {
    assert_eq!(key, "353412");
    assert_eq!(q.get("details").map(String::as_str), Some("true"));
    Json(json!([{
        "EpochTime": 1_709_287_200,
        "WeatherText": "Mist",
        "WeatherIcon": 11,
        "Temperature": {"Metric": {"Value": 19.0, "Unit": "C"}},
        "RealFeelTemperature": {"Metric": {"Value": 18.0, "Unit": "C"}},
        "RelativeHumidity": 93,
        "Wind": {"Direction": {"Degrees": 90}, "Speed": {"Metric": {"Value": 7.2, "Unit": "km/h"}}},
        "Pressure": {"Metric": {"Value": 1016.0, "Unit": "mb"}}
    }]))
}

async fn news_headlines(Query(q): Q) -> Json<Value> {
    assert_eq!(q.get("category").map(String::as_str), Some("science"));
    assert!(q.get("country").is_none());
    Json(json!({"status": "ok", "totalResults": 0, "articles": []}))
}

async fn serve() -> String {
    let app = Router::new()
        .route("/owm/weather", get(owm_weather))
        .route("/accu/locations/v1/cities/search", get(accu_search))
        .route("/accu/currentconditions/v1/{key}", get(accu_current))
        .route("/news/top-headlines", get(news_headlines))
        .route("/slow/weather", get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn openweathermap_fetches_and_normalizes() {
    let base = serve().await;
    let http = build_client(Duration::from_secs(5)).unwrap();
    let client = OpenWeatherMapClient::new("good-key", http).with_base_url(format!("{base}/owm/"));

    let raw = client.fetch_current("Hanoi").await.unwrap();
    let obs = normalize_weather(client.provider(), &raw).unwrap();
    assert_eq!(obs.city, "Hanoi");
    assert_eq!(obs.temperature, 30.5);
    assert_eq!(obs.provider, WeatherProvider::OpenWeatherMap);
}

#[tokio::test]
async fn upstream_rejection_is_an_upstream_error() {
    let base = serve().await;
    let http = build_client(Duration::from_secs(5)).unwrap();
    let client = OpenWeatherMapClient::new("bad-key", http).with_base_url(format!("{base}/owm"));

    match client.fetch_current("Hanoi").await {
        Err(AppError::Upstream { provider, message }) => {
            assert_eq!(provider, "openweathermap");
            assert!(message.contains("401"), "{message}");
            assert!(!message.contains("bad-key"), "api key leaked: {message}");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn accuweather_resolves_location_then_conditions() {
    let base = serve().await;
    let http = build_client(Duration::from_secs(5)).unwrap();
    let client = AccuWeatherClient::new("k", http).with_base_url(format!("{base}/accu"));

    let raw = client.fetch_current("Hanoi").await.unwrap();
    let obs = normalize_weather(WeatherProvider::AccuWeather, &raw).unwrap();
    assert_eq!(obs.city, "Hanoi");
    assert_eq!(obs.country, "VN");
    assert_eq!(obs.wind_speed, 2.0);
    assert_eq!(obs.condition_icon, "11");

    let err = client.fetch_current("Nowhere").await.unwrap_err();
    assert!(err.to_string().contains("no location found"));
}

#[tokio::test]
async fn newsapi_passes_category_and_optional_country() {
    let base = serve().await;
    let http = build_client(Duration::from_secs(5)).unwrap();
    let client = NewsApiClient::new("k", http).with_base_url(format!("{base}/news"));
    let raw = client.fetch_top_headlines("science", None).await.unwrap();
    assert_eq!(raw["status"], "ok");
}

#[tokio::test]
async fn client_timeout_surfaces_as_upstream_error() {
    let base = serve().await;
    let http = build_client(Duration::from_millis(100)).unwrap();
    let client = OpenWeatherMapClient::new("good-key", http).with_base_url(format!("{base}/slow"));
    let err = client.fetch_current("Hanoi").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream { .. }));
}
