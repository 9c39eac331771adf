//! Weather & news aggregator: binary entrypoint.
//! Loads configuration, starts the ingest scheduler and serves the read API.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weather_news_aggregator::aggregate::Aggregator;
use weather_news_aggregator::api::{self, AppState};
use weather_news_aggregator::config::AppConfig;
use weather_news_aggregator::ingest::scheduler::spawn_scheduler;
use weather_news_aggregator::metrics::Metrics;

/// Compact logs by default, JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ingest=info,aggregate=info,store=info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber may already be installed by the hosting runtime.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Arc::new(AppConfig::load().context("loading aggregator configuration")?);
    tracing::info!(
        environment = %config.environment,
        backend = %config.storage.backend,
        provider = %config.weather_provider,
        cities = config.cities.len(),
        "configuration loaded"
    );

    let metrics = Metrics::init(config.fetch_interval_secs)?;
    let aggregator = Arc::new(
        Aggregator::from_config(config.clone()).context("building provider clients")?,
    );

    match config.fetch_interval() {
        Some(interval) => {
            spawn_scheduler(aggregator.clone(), interval);
        }
        None => tracing::info!(target: "ingest", "scheduler disabled (FETCH_INTERVAL_SECS=0)"),
    }

    let state = AppState::new(aggregator).with_metrics(metrics);
    let router = api::create_router(state);

    Ok(router.into())
}
