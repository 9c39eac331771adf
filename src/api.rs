// src/api.rs
//! HTTP read surface. Every JSON response uses the `{success, data}` envelope;
//! failures use `{success:false, message, error}`.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::aggregate::{AggregatedData, Aggregator};
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::model::{NewsRecord, WeatherRecord};
use crate::query::{Page, QueryParams};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn fail(&self, error: AppError) -> ApiError {
        ApiError {
            error,
            expose_detail: !self.aggregator.config().is_production(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/aggregated-data", get(aggregated_data))
        .route("/api/weather", get(list_weather))
        .route("/api/weather/{id}", get(weather_by_id))
        .route("/api/news", get(list_news))
        .route("/api/news/{id}", get(news_by_id))
        .fallback(route_not_found);

    if let Some(metrics) = &state.metrics {
        router = router.merge(metrics.router());
    }

    router.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// An [`AppError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    expose_detail: bool,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.error {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Duplicate { .. } => StatusCode::CONFLICT,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Repository { .. } | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.error {
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound { .. } => "not_found",
            AppError::Duplicate { .. } => "duplicate",
            AppError::Upstream { .. } => "upstream_error",
            AppError::Repository { .. } => "repository_error",
            AppError::Config(_) => "config_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if self.error.is_client_error() {
            json!({ "success": false, "message": self.error.to_string(), "error": self.code() })
        } else {
            error!(target: "aggregate", error = %self.error, status = status.as_u16(), "request failed");
            let detail = if self.expose_detail {
                self.error.to_string()
            } else {
                self.code().to_string()
            };
            json!({ "success": false, "message": INTERNAL_MESSAGE, "error": detail })
        };
        (status, Json(body)).into_response()
    }
}

fn params_of(raw: Option<String>) -> QueryParams {
    QueryParams::parse(raw.as_deref().unwrap_or_default())
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::bad_request(format!("invalid id '{raw}'")))
}

async fn health(State(state): State<AppState>) -> Response {
    let (status, database) = match state.aggregator.check_connection().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            error!(target: "store", error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    let label = if status == StatusCode::OK { "ok" } else { "degraded" };
    let body = ok(json!({
        "status": label,
        "database": database,
        "timestamp": Utc::now(),
    }));
    (status, body).into_response()
}

async fn aggregated_data(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Envelope<AggregatedData>>, ApiError> {
    let params = params_of(raw);
    state
        .aggregator
        .get_aggregated_data(&params)
        .await
        .map(ok)
        .map_err(|e| state.fail(e))
}

async fn list_weather(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Envelope<Page<WeatherRecord>>>, ApiError> {
    state
        .aggregator
        .list_weather(&params_of(raw))
        .await
        .map(ok)
        .map_err(|e| state.fail(e))
}

async fn list_news(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Envelope<Page<NewsRecord>>>, ApiError> {
    state
        .aggregator
        .list_news(&params_of(raw))
        .await
        .map(ok)
        .map_err(|e| state.fail(e))
}

async fn weather_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<WeatherRecord>>, ApiError> {
    let id = parse_id(&id).map_err(|e| state.fail(e))?;
    state
        .aggregator
        .weather_by_id(id)
        .await
        .map(ok)
        .map_err(|e| state.fail(e))
}

async fn news_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<NewsRecord>>, ApiError> {
    let id = parse_id(&id).map_err(|e| state.fail(e))?;
    state
        .aggregator
        .news_by_id(id)
        .await
        .map(ok)
        .map_err(|e| state.fail(e))
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Route not found" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidationError};

    fn api(error: AppError) -> ApiError {
        ApiError {
            error,
            expose_detail: false,
        }
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            api(AppError::Validation(ValidationError::single("city", "city is required"))).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(api(AppError::bad_request("x")).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            api(AppError::NotFound { entity: "news", id: 3 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            api(AppError::Duplicate { entity: "news", key: "u".into() }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(api(AppError::upstream("newsapi", "503")).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            api(AppError::repository("count", StoreError::Query("boom".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("-1").is_err());
    }
}
