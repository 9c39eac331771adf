// src/aggregate.rs
//! The aggregation orchestrator: combined paginated reads over weather and
//! news, and the fetch-and-persist entry point used by the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::ingest::providers::{http::build_client, news_source_from_config, weather_source_from_config};
use crate::ingest::types::{IngestReport, NewsSource, WeatherSource};
use crate::ingest::{self, IngestPlan};
use crate::model::{NewsRecord, WeatherRecord};
use crate::query::{EntitySchema, Page, PageQuery, PaginationMeta, QueryParams};
use crate::repository::{Entity, Repositories, Repository, NEWS_SCHEMA, WEATHER_SCHEMA};

pub const INIT_FAILED_MESSAGE: &str = "Failed to initialize data repositories";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedData {
    pub news: Page<NewsRecord>,
    pub weather: Page<WeatherRecord>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregatedData {
    fn degraded(error: String) -> Self {
        Self {
            news: Page::empty(),
            weather: Page::empty(),
            timestamp: Utc::now(),
            error: Some(error),
        }
    }
}

/// Parameters addressed to `own`: everything except named filters that only
/// the other entity declares (`provider` is a weather filter, not a news one).
fn scoped_params(params: &QueryParams, own: &EntitySchema, other: &EntitySchema) -> QueryParams {
    params.filtered(|key| own.filter(key).is_some() || other.filter(key).is_none())
}

async fn paginate<E: Entity>(
    repo: &dyn Repository<E>,
    query: &PageQuery,
) -> Result<Page<E>, AppError> {
    let (items, total) = tokio::try_join!(
        repo.find_all(&query.criteria, &query.options),
        repo.count(&query.criteria)
    )?;
    Ok(Page {
        items,
        pagination: PaginationMeta::new(total, query.options.page, query.options.limit),
    })
}

pub struct Aggregator {
    config: Arc<AppConfig>,
    repos: OnceCell<Repositories>,
    weather_source: Option<Arc<dyn WeatherSource>>,
    news_source: Option<Arc<dyn NewsSource>>,
}

impl Aggregator {
    /// An aggregator without provider sources; repositories are opened from
    /// `config.storage` on first use.
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            repos: OnceCell::new(),
            weather_source: None,
            news_source: None,
        }
    }

    /// Build sources for every provider that has an API key.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, AppError> {
        let http = build_client(config.request_timeout())?;
        let weather = weather_source_from_config(&config, &http)
            .map_err(|e| warn!(target: "aggregate", error = %e, "weather ingest disabled"))
            .ok();
        let news = news_source_from_config(&config, &http)
            .map_err(|e| warn!(target: "aggregate", error = %e, "news ingest disabled"))
            .ok();
        Ok(Self::new(config).with_sources(weather, news))
    }

    pub fn with_repositories(mut self, repos: Repositories) -> Self {
        self.repos = OnceCell::new_with(Some(repos));
        self
    }

    pub fn with_sources(
        mut self,
        weather: Option<Arc<dyn WeatherSource>>,
        news: Option<Arc<dyn NewsSource>>,
    ) -> Self {
        self.weather_source = weather;
        self.news_source = news;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Repositories, connected once. Concurrent first callers share one
    /// in-flight initialization; a failed attempt is retried on the next call.
    pub async fn repositories(&self) -> Result<&Repositories, AppError> {
        self.repos
            .get_or_try_init(|| async {
                info!(target: "aggregate", backend = %self.config.storage.backend, "initializing repositories");
                Repositories::connect(&self.config.storage).await
            })
            .await
    }

    /// Error text safe to return to clients.
    pub fn public_error(&self, err: &AppError) -> String {
        if self.config.is_production() {
            INIT_FAILED_MESSAGE.to_string()
        } else {
            err.to_string()
        }
    }

    /// Weather and news pages for the same request, queried in parallel.
    ///
    /// Malformed filters are returned as errors. A failing branch degrades to an
    /// empty page; failing to initialize the repositories degrades the whole
    /// response and sets `error`.
    pub async fn get_aggregated_data(&self, params: &QueryParams) -> Result<AggregatedData, AppError> {
        let pagination = self.config.pagination;
        let weather_query = PageQuery::build(
            &WEATHER_SCHEMA,
            &scoped_params(params, &WEATHER_SCHEMA, &NEWS_SCHEMA),
            pagination,
        )?;
        let news_query = PageQuery::build(
            &NEWS_SCHEMA,
            &scoped_params(params, &NEWS_SCHEMA, &WEATHER_SCHEMA),
            pagination,
        )?;

        let repos = match self.repositories().await {
            Ok(r) => r,
            Err(e) => {
                error!(target: "aggregate", error = %e, "repository initialization failed");
                return Ok(AggregatedData::degraded(self.public_error(&e)));
            }
        };

        let (weather, news) = tokio::join!(
            paginate(repos.weather.as_ref(), &weather_query),
            paginate(repos.news.as_ref(), &news_query)
        );

        let weather = weather.unwrap_or_else(|e| {
            warn!(target: "aggregate", error = %e, "weather branch degraded to empty");
            Page::empty()
        });
        let news = news.unwrap_or_else(|e| {
            warn!(target: "aggregate", error = %e, "news branch degraded to empty");
            Page::empty()
        });

        Ok(AggregatedData {
            news,
            weather,
            timestamp: Utc::now(),
            error: None,
        })
    }

    pub async fn list_weather(&self, params: &QueryParams) -> Result<Page<WeatherRecord>, AppError> {
        let query = PageQuery::build(&WEATHER_SCHEMA, params, self.config.pagination)?;
        let repos = self.repositories().await?;
        paginate(repos.weather.as_ref(), &query).await
    }

    pub async fn list_news(&self, params: &QueryParams) -> Result<Page<NewsRecord>, AppError> {
        let query = PageQuery::build(&NEWS_SCHEMA, params, self.config.pagination)?;
        let repos = self.repositories().await?;
        paginate(repos.news.as_ref(), &query).await
    }

    pub async fn weather_by_id(&self, id: i64) -> Result<WeatherRecord, AppError> {
        self.repositories()
            .await?
            .weather
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: WeatherRecord::NAME,
                id,
            })
    }

    pub async fn news_by_id(&self, id: i64) -> Result<NewsRecord, AppError> {
        self.repositories()
            .await?
            .news
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: NewsRecord::NAME,
                id,
            })
    }

    pub fn ingest_plan(&self) -> IngestPlan {
        IngestPlan {
            cities: self.config.cities.clone(),
            news_category: self.config.news.category.clone(),
            news_country: self.config.news.country.clone(),
            timeout: self.config.request_timeout(),
        }
    }

    /// Fetch every configured city and the configured news category, and
    /// persist the results. Per-item failures are in the report.
    pub async fn fetch_and_store(&self) -> Result<IngestReport, AppError> {
        let repos = self.repositories().await?;
        Ok(ingest::run_once(
            self.weather_source.as_deref(),
            self.news_source.as_deref(),
            repos,
            &self.ingest_plan(),
        )
        .await)
    }

    pub async fn check_connection(&self) -> Result<(), AppError> {
        self.repositories().await?.check_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{BackendKind, StorageConfig};

    #[test]
    fn entity_only_filters_are_scoped() {
        let params = QueryParams::parse("provider=accuweather&query=rain&fromDate=2024-01-01&page=2");
        let weather = scoped_params(&params, &WEATHER_SCHEMA, &NEWS_SCHEMA);
        let news = scoped_params(&params, &NEWS_SCHEMA, &WEATHER_SCHEMA);

        assert!(weather.get("provider").is_some());
        assert!(weather.get("query").is_none());
        assert!(weather.get("fromDate").is_some());
        assert!(weather.get("page").is_some());

        assert!(news.get("provider").is_none());
        assert!(news.get("query").is_some());
        assert!(news.get("fromDate").is_some());
    }

    #[test]
    fn production_hides_error_detail() {
        let mut cfg = AppConfig::default();
        cfg.environment = "production".into();
        let agg = Aggregator::new(Arc::new(cfg));
        let err = AppError::Config("secret path /etc/db".into());
        assert_eq!(agg.public_error(&err), INIT_FAILED_MESSAGE);

        let agg = Aggregator::new(Arc::new(AppConfig::default()));
        assert!(agg.public_error(&err).contains("secret path"));
    }

    #[tokio::test]
    async fn concurrent_first_calls_share_one_initialization() {
        let mut cfg = AppConfig::default();
        cfg.storage = StorageConfig::in_memory(BackendKind::Sqlx);
        let agg = Aggregator::new(Arc::new(cfg));

        let (a, b, c) = tokio::join!(agg.repositories(), agg.repositories(), agg.repositories());
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(b, c));

        // One in-memory database behind all of them.
        a.weather
            .create(crate::model::WeatherObservation {
                city: "Hanoi".into(),
                ..sample_observation()
            })
            .await
            .unwrap();
        let all = PageQuery::build(&WEATHER_SCHEMA, &QueryParams::new(), Default::default()).unwrap();
        assert_eq!(c.weather.count(&all.criteria).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_initialization_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let db_dir = dir.path().join("data");
        let mut cfg = AppConfig::default();
        cfg.storage = StorageConfig {
            url: format!("sqlite://{}", db_dir.join("agg.db").display()),
            ..StorageConfig::in_memory(BackendKind::Sqlx)
        };
        let agg = Aggregator::new(Arc::new(cfg));

        assert!(agg.repositories().await.is_err());
        let degraded = agg.get_aggregated_data(&QueryParams::new()).await.unwrap();
        assert!(degraded.error.is_some());

        std::fs::create_dir(&db_dir).unwrap();
        let first = agg.repositories().await.expect("retried after the directory exists");
        let second = agg.repositories().await.unwrap();
        assert!(std::ptr::eq(first, second));
        let data = agg.get_aggregated_data(&QueryParams::new()).await.unwrap();
        assert!(data.error.is_none());
    }

    #[tokio::test]
    async fn explicit_offset_sets_current_page() {
        let mut cfg = AppConfig::default();
        cfg.storage = StorageConfig::in_memory(BackendKind::Sqlx);
        let agg = Aggregator::new(Arc::new(cfg));
        let repos = agg.repositories().await.unwrap();
        for hour in 0..5 {
            repos
                .weather
                .create(crate::model::WeatherObservation {
                    timestamp: Utc::now() - chrono::Duration::hours(hour),
                    ..sample_observation()
                })
                .await
                .unwrap();
        }

        let data = agg
            .get_aggregated_data(&QueryParams::parse("offset=2&limit=2"))
            .await
            .unwrap();
        let meta = &data.weather.pagination;
        assert_eq!(data.weather.items.len(), 2);
        assert_eq!(meta.current_page, 2);
        assert!(meta.has_previous_page);
        assert!(meta.has_next_page);
    }

    fn sample_observation() -> crate::model::WeatherObservation {
        crate::model::WeatherObservation {
            provider: crate::model::WeatherProvider::OpenWeatherMap,
            city: "Da Nang".into(),
            country: "VN".into(),
            latitude: 16.05,
            longitude: 108.2,
            temperature: 27.0,
            feels_like: 29.0,
            temp_min: 26.0,
            temp_max: 28.0,
            humidity: 75,
            pressure: 1008,
            wind_speed: 3.1,
            wind_direction: 140,
            condition_main: "Clear".into(),
            condition_description: "clear sky".into(),
            condition_icon: "01d".into(),
            timestamp: Utc::now(),
        }
    }
}
