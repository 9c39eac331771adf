// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use common::{article, at, memory_repos, observation, BODY_LIMIT};
use weather_news_aggregator::error::{AppError, StoreError};
use weather_news_aggregator::metrics::Metrics;
use weather_news_aggregator::model::WeatherRecord;
use weather_news_aggregator::query::{Criteria, FindOptions};
use weather_news_aggregator::repository::{BackendKind, Repositories, Repository, StorageConfig};
use weather_news_aggregator::{create_router, AggregatedData, Aggregator, AppConfig, AppState};

/// A weather repository whose storage is gone.
struct BrokenWeather;

fn gone(op: &'static str) -> AppError {
    AppError::repository(op, StoreError::Connection("disk unplugged".into()))
}

#[async_trait]
impl Repository<WeatherRecord> for BrokenWeather {
    async fn create(&self, _: weather_news_aggregator::model::WeatherObservation) -> Result<WeatherRecord, AppError> {
        Err(gone("create"))
    }
    async fn find_by_id(&self, _: i64) -> Result<Option<WeatherRecord>, AppError> {
        Err(gone("find_by_id"))
    }
    async fn find_all(&self, _: &Criteria, _: &FindOptions) -> Result<Vec<WeatherRecord>, AppError> {
        Err(gone("find_all"))
    }
    async fn update(
        &self,
        _: i64,
        _: weather_news_aggregator::model::WeatherObservation,
    ) -> Result<WeatherRecord, AppError> {
        Err(gone("update"))
    }
    async fn delete(&self, _: i64) -> Result<(), AppError> {
        Err(gone("delete"))
    }
    async fn count(&self, _: &Criteria) -> Result<u64, AppError> {
        Err(gone("count"))
    }
    fn validate(&self, _: &weather_news_aggregator::model::WeatherObservation) -> Result<(), AppError> {
        Ok(())
    }
    async fn check_connection(&self) -> Result<(), AppError> {
        Err(gone("check_connection"))
    }
}

async fn seeded_repos() -> Repositories {
    let repos = memory_repos(BackendKind::Sqlx).await;
    for (i, temp) in [22.0, 26.0, 31.0].into_iter().enumerate() {
        repos
            .weather
            .create(observation("Hanoi", temp, at(1, i as u32)))
            .await
            .unwrap();
    }
    repos
        .weather
        .create(observation("Da Nang", 29.0, at(2, 0)))
        .await
        .unwrap();
    repos.news.create(article("rain", "Heavy rain in Hanoi", at(1, 5))).await.unwrap();
    repos.news.create(article("stocks", "Stocks climb", at(2, 5))).await.unwrap();
    repos
}

fn router_with(config: AppConfig, repos: Repositories) -> Router {
    let aggregator = Aggregator::new(Arc::new(config)).with_repositories(repos);
    create_router(AppState::new(Arc::new(aggregator)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    let v: Json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn aggregated_data_returns_both_pages() {
    let app = router_with(AppConfig::default(), seeded_repos().await);
    let (status, v) = get(app, "/api/aggregated-data?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    let data = &v["data"];
    assert!(data.get("timestamp").is_some());
    assert!(data.get("error").is_none());

    assert_eq!(data["weather"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(data["weather"]["pagination"]["totalItems"], 4);
    assert_eq!(data["weather"]["pagination"]["totalPages"], 2);
    assert_eq!(data["weather"]["pagination"]["hasNextPage"], true);
    assert_eq!(data["weather"]["pagination"]["hasPreviousPage"], false);
    // newest first
    assert_eq!(data["weather"]["items"][0]["city"], "Da Nang");

    assert_eq!(data["news"]["pagination"]["totalItems"], 2);
    assert_eq!(data["news"]["items"][0]["title"], "Stocks climb");
}

#[tokio::test]
async fn entity_filters_only_narrow_their_own_entity() {
    let app = router_with(AppConfig::default(), seeded_repos().await);
    let (status, v) = get(app, "/api/aggregated-data?city=hanoi&query=rain&provider=openweathermap").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["weather"]["pagination"]["totalItems"], 3);
    assert_eq!(v["data"]["news"]["pagination"]["totalItems"], 1);
    assert_eq!(v["data"]["news"]["items"][0]["url"], "https://news.example.test/rain");
}

#[tokio::test]
async fn failing_weather_branch_degrades_to_empty_page() {
    let repos = seeded_repos().await;
    let broken = Repositories {
        weather: Arc::new(BrokenWeather),
        news: repos.news.clone(),
    };
    let app = router_with(AppConfig::default(), broken);
    let (status, v) = get(app, "/api/aggregated-data").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["weather"]["items"], serde_json::json!([]));
    assert_eq!(v["data"]["weather"]["pagination"]["totalItems"], 0);
    assert_eq!(v["data"]["news"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn repository_init_failure_is_reported_in_data() {
    let mut config = AppConfig::default();
    config.storage = StorageConfig {
        backend: "sqlx".into(),
        url: "sqlite:///nonexistent-dir/for/sure/agg.db".into(),
        auth_token: None,
        max_connections: 1,
    };
    config.environment = "production".into();
    let aggregator = Aggregator::new(Arc::new(config));
    let app = create_router(AppState::new(Arc::new(aggregator)));

    let (status, v) = get(app, "/api/aggregated-data").await;
    assert_eq!(status, StatusCode::OK);
    let data: AggregatedData = serde_json::from_value(v["data"].clone()).unwrap_or_else(|_| {
        panic!("data should deserialize: {}", v["data"])
    });
    assert!(data.weather.items.is_empty());
    assert!(data.news.items.is_empty());
    assert_eq!(data.error.as_deref(), Some("Failed to initialize data repositories"));
}

#[tokio::test]
async fn malformed_filters_are_rejected_with_400() {
    let repos = seeded_repos().await;

    let (status, v) = get(router_with(AppConfig::default(), repos.clone()), "/api/aggregated-data?temperature__between=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["success"], false);
    assert!(v["message"].as_str().unwrap().contains("between"));

    let (status, v) = get(router_with(AppConfig::default(), repos.clone()), "/api/weather?provider=bbc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "validation_error");

    let (status, _) = get(router_with(AppConfig::default(), repos), "/api/weather?minTemperature=warm").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_offsets_are_rejected_with_400() {
    let repos = seeded_repos().await;

    for uri in [
        "/api/weather?offset=18446744073709551615",
        "/api/news?offset=-5",
        "/api/aggregated-data?offset=18446744073709551615",
    ] {
        let (status, v) = get(router_with(AppConfig::default(), repos.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {v}");
        assert_eq!(v["success"], false);
        assert!(v["message"].as_str().unwrap().contains("offset"), "{uri}: {v}");
    }
}

#[tokio::test]
async fn explicit_offset_drives_page_metadata() {
    let app = router_with(AppConfig::default(), seeded_repos().await);
    let (status, v) = get(app, "/api/weather?offset=2&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let pagination = &v["data"]["pagination"];
    assert_eq!(pagination["currentPage"], 2);
    assert_eq!(pagination["hasPreviousPage"], true);
    assert_eq!(pagination["hasNextPage"], false);
    assert_eq!(v["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn single_records_and_missing_ids() {
    let repos = seeded_repos().await;

    let (status, v) = get(router_with(AppConfig::default(), repos.clone()), "/api/news/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["id"], 1);
    assert_eq!(v["data"]["sourceName"], "Example Wire");

    let (status, v) = get(router_with(AppConfig::default(), repos.clone()), "/api/weather/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["success"], false);

    let (status, _) = get(router_with(AppConfig::default(), repos), "/api/weather/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_get_json_404() {
    let app = router_with(AppConfig::default(), seeded_repos().await);
    let (status, v) = get(app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v, serde_json::json!({"success": false, "message": "Route not found"}));
}

#[tokio::test]
async fn health_reports_storage_state() {
    let (status, v) = get(router_with(AppConfig::default(), seeded_repos().await), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["data"]["status"], "ok");

    let repos = seeded_repos().await;
    let broken = Repositories {
        weather: Arc::new(BrokenWeather),
        news: repos.news,
    };
    let (status, v) = get(router_with(AppConfig::default(), broken), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(v["data"]["database"], "unavailable");
}

#[tokio::test]
async fn metrics_route_is_mounted_when_configured() {
    let aggregator = Aggregator::new(Arc::new(AppConfig::default()))
        .with_repositories(memory_repos(BackendKind::Sqlx).await);
    let state = AppState::new(Arc::new(aggregator)).with_metrics(Metrics::detached());
    let app = create_router(state);

    let req = Request::get("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
