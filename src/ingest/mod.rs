// src/ingest/mod.rs
//! Fetch → transform → persist pipeline used by the scheduler.
//!
//! Every city and every article is handled independently: one failure is
//! recorded in the [`IngestReport`] and never aborts its siblings.

pub mod providers;
pub mod scheduler;
pub mod types;

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::model::{NewsArticle, WeatherRecord};
use crate::repository::Repositories;
use crate::transform::{normalize_weather, NewsApiTransformer, Transformer};
use types::{IngestReport, ItemResult, NewsSource, WeatherSource};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Completed ingest runs.");
        describe_counter!(
            "ingest_items_stored_total",
            "Records persisted by the ingest pipeline, by kind."
        );
        describe_counter!(
            "ingest_items_skipped_total",
            "Records skipped (duplicates, unconfigured providers), by kind."
        );
        describe_counter!(
            "ingest_items_failed_total",
            "Records that failed to fetch, transform or store, by kind."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch errors and timeouts, by provider."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// What one run should fetch.
#[derive(Debug, Clone)]
pub struct IngestPlan {
    pub cities: Vec<String>,
    pub news_category: String,
    pub news_country: Option<String>,
    /// Applied to each upstream call on its own.
    pub timeout: Duration,
}

/// Run `fut` under `limit`; elapsing becomes an `Upstream` error for `provider`.
pub async fn with_timeout<T, F>(provider: &str, limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    let t0 = Instant::now();
    let res = match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(AppError::upstream(
            provider,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    };
    histogram!("ingest_fetch_ms", "provider" => provider.to_string())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);
    if res.is_err() {
        counter!("ingest_provider_errors_total", "provider" => provider.to_string()).increment(1);
    }
    res
}

async fn fetch_and_store_city(
    source: &dyn WeatherSource,
    repos: &Repositories,
    city: &str,
    timeout: Duration,
) -> Result<WeatherRecord, AppError> {
    let provider = source.provider();
    let raw = with_timeout(provider.as_str(), timeout, source.fetch_current(city)).await?;
    let observation = normalize_weather(provider, &raw)?;
    repos.weather.create(observation).await
}

async fn ingest_city(
    source: &dyn WeatherSource,
    repos: &Repositories,
    city: &str,
    timeout: Duration,
) -> ItemResult {
    let provider = source.provider();
    match fetch_and_store_city(source, repos, city, timeout).await {
        Ok(record) => {
            debug!(target: "ingest", city, id = record.id, "weather stored");
            ItemResult::stored(city, record.id)
        }
        Err(e) => {
            warn!(target: "ingest", city, %provider, error = %e, "weather ingest failed");
            ItemResult::failed(city, &e)
        }
    }
}

async fn store_article(repos: &Repositories, article: NewsArticle) -> ItemResult {
    let url = article.url.clone();
    match repos.news.create(article).await {
        Ok(record) => ItemResult::stored(url, record.id),
        Err(e) if e.is_duplicate() => {
            debug!(target: "ingest", %url, "duplicate article skipped");
            ItemResult::skipped(url, "duplicate url")
        }
        Err(e) => {
            warn!(target: "ingest", %url, error = %e, "article store failed");
            ItemResult::failed(url, &e)
        }
    }
}

async fn ingest_news(source: &dyn NewsSource, repos: &Repositories, plan: &IngestPlan) -> Vec<ItemResult> {
    let fetched = with_timeout(
        source.name(),
        plan.timeout,
        source.fetch_top_headlines(&plan.news_category, plan.news_country.as_deref()),
    )
    .await
    .and_then(|raw| NewsApiTransformer.normalize(&raw).map_err(AppError::from));

    match fetched {
        Ok(articles) => join_all(articles.into_iter().map(|a| store_article(repos, a))).await,
        Err(e) => {
            warn!(target: "ingest", provider = source.name(), error = %e, "news fetch failed");
            vec![ItemResult::failed(source.name(), &e)]
        }
    }
}

/// Run one fetch-and-persist pass. Missing sources are reported as skipped.
pub async fn run_once(
    weather: Option<&dyn WeatherSource>,
    news: Option<&dyn NewsSource>,
    repos: &Repositories,
    plan: &IngestPlan,
) -> IngestReport {
    ensure_metrics_described();

    let weather_branch = async {
        match weather {
            Some(source) => {
                join_all(
                    plan.cities
                        .iter()
                        .map(|city| ingest_city(source, repos, city, plan.timeout)),
                )
                .await
            }
            None => vec![ItemResult::skipped("weather", "no weather provider configured")],
        }
    };
    let news_branch = async {
        match news {
            Some(source) => ingest_news(source, repos, plan).await,
            None => vec![ItemResult::skipped("news", "no news provider configured")],
        }
    };
    let (weather_results, news_results) = tokio::join!(weather_branch, news_branch);

    let report = IngestReport {
        weather: weather_results,
        news: news_results,
    };
    record_metrics(&report);

    info!(
        target: "ingest",
        stored = report.stored(),
        skipped = report.skipped(),
        failed = report.failed(),
        "ingest run finished"
    );
    report
}

fn record_metrics(report: &IngestReport) {
    for (kind, items) in [("weather", &report.weather), ("news", &report.news)] {
        let mut stored = 0u64;
        let mut skipped = 0u64;
        let mut failed = 0u64;
        for item in items {
            match item.outcome {
                types::Outcome::Stored { .. } => stored += 1,
                types::Outcome::Skipped { .. } => skipped += 1,
                types::Outcome::Failed { .. } => failed += 1,
            }
        }
        counter!("ingest_items_stored_total", "kind" => kind).increment(stored);
        counter!("ingest_items_skipped_total", "kind" => kind).increment(skipped);
        counter!("ingest_items_failed_total", "kind" => kind).increment(failed);
    }
    counter!("ingest_runs_total").increment(1);
    gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
}
