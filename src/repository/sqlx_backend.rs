// src/repository/sqlx_backend.rs
//! Pooled SQLite backend built on sqlx.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row as _, Sqlite, TypeInfo, ValueRef};
use tracing::{debug, info};

use super::backend::{BackendKind, Row, SqlBackend, StorageConfig};
use crate::error::StoreError;
use crate::query::SqlValue;

pub struct SqlxBackend {
    pool: SqlitePool,
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

impl SqlxBackend {
    pub async fn connect(cfg: &StorageConfig) -> Result<Self, StoreError> {
        info!(target: "store", url = %cfg.url, "opening sqlx pool");

        let options = SqliteConnectOptions::from_str(&cfg.url)
            .map_err(|e| StoreError::Connection(format!("invalid sqlite url: {e}")))?
            .create_if_missing(true);

        // Every connection to `:memory:` is its own database, so in-memory
        // pools hold exactly one connection and never recycle it.
        let pool_options = if is_memory_url(&cfg.url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(cfg.max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("failed to open sqlite pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for p in params {
        query = match p {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row, StoreError> {
    let decode_err = |e: sqlx::Error| StoreError::Decode(e.to_string());
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i).map_err(decode_err)?;
            if raw.is_null() {
                return Ok(SqlValue::Null);
            }
            let type_name = raw.type_info().name().to_ascii_uppercase();
            let value = match type_name.as_str() {
                "INTEGER" | "BOOLEAN" | "INT8" | "BIGINT" => {
                    SqlValue::Integer(row.try_get_unchecked::<i64, _>(i).map_err(decode_err)?)
                }
                "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                    SqlValue::Real(row.try_get_unchecked::<f64, _>(i).map_err(decode_err)?)
                }
                _ => SqlValue::Text(row.try_get_unchecked::<String, _>(i).map_err(decode_err)?),
            };
            Ok(value)
        })
        .collect()
}

#[async_trait]
impl SqlBackend for SqlxBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlx
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError> {
        debug!(target: "store", sql, "execute");
        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, StoreError> {
        debug!(target: "store", sql, "insert");
        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.last_insert_rowid())
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        debug!(target: "store", sql, "query");
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        rows.iter().map(decode_row).collect()
    }
}
