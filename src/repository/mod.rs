// src/repository/mod.rs
//! Persistence for weather and news records.
//!
//! One generic [`SqlRepository`] serves every entity; the storage engine is a
//! [`SqlBackend`] strategy picked by [`create_backend`] from configuration.

pub mod backend;
pub mod entity;
pub mod libsql_backend;
pub mod migrations;
pub mod news;
pub mod sanitize;
pub mod sqlx_backend;
pub mod weather;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

pub use backend::{BackendKind, RowReader, SqlBackend, StorageConfig};
pub use entity::Entity;
pub use libsql_backend::LibsqlBackend;
pub use news::NEWS_SCHEMA;
pub use sqlx_backend::SqlxBackend;
pub use weather::WEATHER_SCHEMA;

use crate::error::{AppError, StoreError};
use crate::model::{NewsRecord, WeatherRecord};
use crate::query::{Criteria, FindOptions, SqlValue};

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn create(&self, draft: E::Draft) -> Result<E, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError>;

    async fn find_all(&self, criteria: &Criteria, options: &FindOptions) -> Result<Vec<E>, AppError>;

    /// Replace the stored fields of `id`. Fails with `NotFound` if absent.
    async fn update(&self, id: i64, draft: E::Draft) -> Result<E, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    async fn count(&self, criteria: &Criteria) -> Result<u64, AppError>;

    fn validate(&self, draft: &E::Draft) -> Result<(), AppError>;

    async fn check_connection(&self) -> Result<(), AppError>;

    /// `update` when an id is given, otherwise `create`.
    async fn save(&self, draft: E::Draft, id: Option<i64>) -> Result<E, AppError> {
        match id {
            Some(id) => self.update(id, draft).await,
            None => self.create(draft).await,
        }
    }
}

pub struct SqlRepository<E> {
    backend: Arc<dyn SqlBackend>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqlRepository<E> {
    pub fn new(backend: Arc<dyn SqlBackend>) -> Self {
        Self {
            backend,
            _entity: PhantomData,
        }
    }

    fn lift(operation: &'static str, err: StoreError, key: Option<String>) -> AppError {
        match err {
            StoreError::UniqueViolation(detail) => AppError::Duplicate {
                entity: E::NAME,
                key: key.unwrap_or(detail),
            },
            other => AppError::repository(operation, other),
        }
    }

    async fn fetch_one(&self, operation: &'static str, id: i64) -> Result<Option<E>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", E::select_list(), E::TABLE);
        let rows = self
            .backend
            .query(&sql, &[SqlValue::Integer(id)])
            .await
            .map_err(|e| Self::lift(operation, e, None))?;
        rows.into_iter()
            .next()
            .map(|row| E::from_row(&mut RowReader::new(row)))
            .transpose()
            .map_err(|e| Self::lift(operation, e, None))
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for SqlRepository<E> {
    async fn create(&self, draft: E::Draft) -> Result<E, AppError> {
        let draft = E::prepare(draft);
        E::validate(&draft)?;

        let now = Utc::now().timestamp();
        let mut columns: Vec<&str> = E::COLUMNS.to_vec();
        let mut values = E::bind(&draft);
        columns.push("created_at");
        values.push(SqlValue::Integer(now));
        if E::HAS_UPDATED_AT {
            columns.push("updated_at");
            values.push(SqlValue::Integer(now));
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let id = self
            .backend
            .insert(&sql, &values)
            .await
            .map_err(|e| Self::lift("create", e, E::unique_key(&draft)))?;

        self.fetch_one("create", id)
            .await?
            .ok_or_else(|| AppError::NotFound { entity: E::NAME, id })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        self.fetch_one("find_by_id", id).await
    }

    async fn find_all(&self, criteria: &Criteria, options: &FindOptions) -> Result<Vec<E>, AppError> {
        let (where_sql, params) = criteria.to_sql();
        let sql = format!(
            "SELECT {} FROM {}{}{}",
            E::select_list(),
            E::TABLE,
            where_sql,
            options.to_sql()
        );
        let rows = self
            .backend
            .query(&sql, &params)
            .await
            .map_err(|e| Self::lift("find_all", e, None))?;
        rows.into_iter()
            .map(|row| E::from_row(&mut RowReader::new(row)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Self::lift("find_all", e, None))
    }

    async fn update(&self, id: i64, draft: E::Draft) -> Result<E, AppError> {
        let draft = E::prepare(draft);
        E::validate(&draft)?;

        let mut assignments: Vec<String> = E::COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
        let mut values = E::bind(&draft);
        if E::HAS_UPDATED_AT {
            assignments.push("updated_at = ?".to_string());
            values.push(SqlValue::Integer(Utc::now().timestamp()));
        }
        values.push(SqlValue::Integer(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            E::TABLE,
            assignments.join(", ")
        );

        let affected = self
            .backend
            .execute(&sql, &values)
            .await
            .map_err(|e| Self::lift("update", e, E::unique_key(&draft)))?;
        if affected == 0 {
            return Err(AppError::NotFound { entity: E::NAME, id });
        }
        self.fetch_one("update", id)
            .await?
            .ok_or_else(|| AppError::NotFound { entity: E::NAME, id })
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let affected = self
            .backend
            .execute(&sql, &[SqlValue::Integer(id)])
            .await
            .map_err(|e| Self::lift("delete", e, None))?;
        if affected == 0 {
            return Err(AppError::NotFound { entity: E::NAME, id });
        }
        Ok(())
    }

    async fn count(&self, criteria: &Criteria) -> Result<u64, AppError> {
        let (where_sql, params) = criteria.to_sql();
        let sql = format!("SELECT COUNT(*) FROM {}{}", E::TABLE, where_sql);
        let rows = self
            .backend
            .query(&sql, &params)
            .await
            .map_err(|e| Self::lift("count", e, None))?;
        let n = backend::scalar_int(rows).map_err(|e| Self::lift("count", e, None))?;
        Ok(n.max(0) as u64)
    }

    fn validate(&self, draft: &E::Draft) -> Result<(), AppError> {
        E::validate(&E::prepare(draft.clone()))?;
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        self.backend
            .ping()
            .await
            .map_err(|e| AppError::repository("check_connection", e))
    }
}

/// Build the backend named by `cfg.backend`, probe it and create the schema.
/// Unknown types are rejected before anything is opened.
pub async fn create_backend(cfg: &StorageConfig) -> Result<Arc<dyn SqlBackend>, AppError> {
    let kind = cfg.kind()?;
    let backend: Arc<dyn SqlBackend> = match kind {
        BackendKind::Sqlx => Arc::new(
            SqlxBackend::connect(cfg)
                .await
                .map_err(|e| AppError::repository("connect", e))?,
        ),
        BackendKind::Libsql => Arc::new(
            LibsqlBackend::connect(cfg)
                .await
                .map_err(|e| AppError::repository("connect", e))?,
        ),
    };

    if let Err(e) = backend.ping().await {
        warn!(target: "store", backend = %kind, error = %e, "backend failed its connection probe");
        return Err(AppError::repository("check_connection", e));
    }
    backend
        .migrate()
        .await
        .map_err(|e| AppError::repository("migrate", e))?;

    info!(target: "store", backend = %kind, "storage backend ready");
    Ok(backend)
}

/// The repositories the aggregator works with.
#[derive(Clone)]
pub struct Repositories {
    pub weather: Arc<dyn Repository<WeatherRecord>>,
    pub news: Arc<dyn Repository<NewsRecord>>,
}

impl Repositories {
    pub fn from_backend(backend: Arc<dyn SqlBackend>) -> Self {
        Self {
            weather: Arc::new(SqlRepository::<WeatherRecord>::new(backend.clone())),
            news: Arc::new(SqlRepository::<NewsRecord>::new(backend)),
        }
    }

    pub async fn connect(cfg: &StorageConfig) -> Result<Self, AppError> {
        Ok(Self::from_backend(create_backend(cfg).await?))
    }

    pub async fn check_connection(&self) -> Result<(), AppError> {
        let (w, n) = tokio::join!(self.weather.check_connection(), self.news.check_connection());
        w.and(n)
    }
}
