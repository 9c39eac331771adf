// src/repository/backend.rs
//! Storage backend strategy shared by every repository.
//!
//! A backend only knows how to run parameterized SQLite-dialect statements and
//! hand back rows of [`SqlValue`]s; entity mapping lives in the repositories.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::migrations;
use crate::error::{AppError, StoreError};
use crate::query::SqlValue;

pub type Row = Vec<SqlValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Pooled SQLite connection through sqlx.
    Sqlx,
    /// libSQL driver: remote Turso database or a local file.
    Libsql,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlx => "sqlx",
            BackendKind::Libsql => "libsql",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlx" | "orm" | "sqlite" => Ok(BackendKind::Sqlx),
            "libsql" | "turso" | "edge" => Ok(BackendKind::Libsql),
            _ => Err(AppError::Config(format!(
                "Unknown repository type '{value}'. Supported types: sqlx (orm), libsql (turso, edge)."
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend discriminator, parsed with [`BackendKind::from_str`].
    #[serde(rename = "type")]
    pub backend: String,
    pub url: String,
    /// Only used by remote libSQL databases.
    pub auth_token: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlx.as_str().to_string(),
            url: "sqlite://data/aggregator.db".to_string(),
            auth_token: None,
            max_connections: 5,
        }
    }
}

impl StorageConfig {
    pub fn in_memory(kind: BackendKind) -> Self {
        let url = match kind {
            BackendKind::Sqlx => "sqlite::memory:",
            BackendKind::Libsql => ":memory:",
        };
        Self {
            backend: kind.as_str().to_string(),
            url: url.to_string(),
            auth_token: None,
            max_connections: 1,
        }
    }

    pub fn kind(&self) -> Result<BackendKind, AppError> {
        self.backend.parse()
    }
}

#[async_trait]
pub trait SqlBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, StoreError>;

    /// Run an `INSERT` and return the new row id.
    async fn insert(&self, sql: &str, params: &[SqlValue]) -> Result<i64, StoreError>;

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        self.query("SELECT 1", &[]).await.map(|_| ())
    }

    /// Create tables and indexes if they do not exist yet.
    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in migrations::STATEMENTS {
            self.execute(statement, &[]).await?;
        }
        Ok(())
    }
}

/// Sequential, typed access to one row's columns.
pub struct RowReader {
    values: std::vec::IntoIter<SqlValue>,
    index: usize,
}

impl RowReader {
    pub fn new(row: Row) -> Self {
        Self {
            values: row.into_iter(),
            index: 0,
        }
    }

    fn next_value(&mut self) -> Result<SqlValue, StoreError> {
        let idx = self.index;
        self.index += 1;
        self.values
            .next()
            .ok_or_else(|| StoreError::Decode(format!("missing column {idx}")))
    }

    fn mismatch(&self, expected: &str, got: &SqlValue) -> StoreError {
        StoreError::Decode(format!(
            "column {} expected {expected}, got {got:?}",
            self.index - 1
        ))
    }

    pub fn int(&mut self) -> Result<i64, StoreError> {
        match self.next_value()? {
            SqlValue::Integer(v) => Ok(v),
            other => Err(self.mismatch("integer", &other)),
        }
    }

    pub fn real(&mut self) -> Result<f64, StoreError> {
        match self.next_value()? {
            SqlValue::Real(v) => Ok(v),
            SqlValue::Integer(v) => Ok(v as f64),
            other => Err(self.mismatch("real", &other)),
        }
    }

    pub fn text(&mut self) -> Result<String, StoreError> {
        match self.next_value()? {
            SqlValue::Text(v) => Ok(v),
            other => Err(self.mismatch("text", &other)),
        }
    }

    pub fn opt_text(&mut self) -> Result<Option<String>, StoreError> {
        match self.next_value()? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v)),
            other => Err(self.mismatch("text or null", &other)),
        }
    }

    pub fn timestamp(&mut self) -> Result<DateTime<Utc>, StoreError> {
        let secs = self.int()?;
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| StoreError::Decode(format!("timestamp {secs} out of range")))
    }

    pub fn opt_timestamp(&mut self) -> Result<Option<DateTime<Utc>>, StoreError> {
        match self.next_value()? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(secs) => DateTime::from_timestamp(secs, 0)
                .map(Some)
                .ok_or_else(|| StoreError::Decode(format!("timestamp {secs} out of range"))),
            other => Err(self.mismatch("integer or null", &other)),
        }
    }
}

/// First column of the first row as an integer, for `COUNT(*)`-style queries.
pub fn scalar_int(rows: Vec<Row>) -> Result<i64, StoreError> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::Decode("scalar query returned no rows".into()))?;
    RowReader::new(row).int()
}
