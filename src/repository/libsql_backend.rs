// src/repository/libsql_backend.rs
//! libSQL backend: a remote Turso database over HTTP, or a local file.

use async_trait::async_trait;
use libsql::params::Params;
use libsql::{Builder, Connection, Database, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::backend::{BackendKind, Row, SqlBackend, StorageConfig};
use crate::error::StoreError;
use crate::query::SqlValue;

pub struct LibsqlBackend {
    _database: Database,
    // `last_insert_rowid` is per connection, so inserts hold the lock across
    // both calls.
    connection: Mutex<Connection>,
}

fn is_remote(url: &str) -> bool {
    url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
}

impl LibsqlBackend {
    pub async fn connect(cfg: &StorageConfig) -> Result<Self, StoreError> {
        let database = if is_remote(&cfg.url) {
            let token = cfg
                .auth_token
                .clone()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    StoreError::Connection("auth token required for remote libSQL database".into())
                })?;
            info!(target: "store", url = %cfg.url, "connecting to remote libSQL database");
            Builder::new_remote(cfg.url.clone(), token)
                .build()
                .await
                .map_err(|e| StoreError::Connection(format!("failed to connect to libSQL: {e}")))?
        } else {
            let path = cfg.url.strip_prefix("file:").unwrap_or(&cfg.url);
            info!(target: "store", path, "opening local libSQL database");
            Builder::new_local(path)
                .build()
                .await
                .map_err(|e| StoreError::Connection(format!("failed to open local database: {e}")))?
        };

        let connection = database
            .connect()
            .map_err(|e| StoreError::Connection(format!("failed to create connection: {e}")))?;

        Ok(Self {
            _database: database,
            connection: Mutex::new(connection),
        })
    }
}

fn to_params(params: &[SqlValue]) -> Params {
    if params.is_empty() {
        return Params::None;
    }
    Params::Positional(
        params
            .iter()
            .map(|p| match p {
                SqlValue::Null => Value::Null,
                SqlValue::Integer(v) => Value::Integer(*v),
                SqlValue::Real(v) => Value::Real(*v),
                SqlValue::Text(v) => Value::Text(v.clone()),
            })
            .collect(),
    )
}

fn from_value(value: Value) -> Result<SqlValue, StoreError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Integer(v) => Ok(SqlValue::Integer(v)),
        Value::Real(v) => Ok(SqlValue::Real(v)),
        Value::Text(v) => Ok(SqlValue::Text(v)),
        Value::Blob(_) => Err(StoreError::Decode("unexpected blob column".into())),
    }
}

fn classify(err: libsql::Error) -> StoreError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed") {
        return StoreError::UniqueViolation(message);
    }
    match err {
        libsql::Error::ConnectionFailed(_) => StoreError::Connection(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl SqlBackend for LibsqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Libsql
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError> {
        debug!(target: "store", sql, "execute");
        let conn = self.connection.lock().await;
        conn.execute(sql, to_params(params)).await.map_err(classify)
    }

    async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, StoreError> {
        debug!(target: "store", sql, "insert");
        let conn = self.connection.lock().await;
        conn.execute(sql, to_params(params)).await.map_err(classify)?;
        Ok(conn.last_insert_rowid())
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        debug!(target: "store", sql, "query");
        let conn = self.connection.lock().await;
        let mut rows = conn.query(sql, to_params(params)).await.map_err(classify)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(classify)? {
            let mut values = Vec::with_capacity(row.column_count().max(0) as usize);
            for i in 0..row.column_count() {
                let value = row
                    .get_value(i)
                    .map_err(|e| StoreError::Decode(format!("column {i}: {e}")))?;
                values.push(from_value(value)?);
            }
            out.push(values);
        }
        Ok(out)
    }
}
