// src/error.rs
//! Error taxonomy shared by transformers, repositories, the aggregator, and the
//! HTTP layer.
//!
//! Storage backends report [`StoreError`]; repositories lift those into
//! [`AppError`] with the failing operation attached, and classify unique
//! constraint violations as [`AppError::Duplicate`] so callers never have to
//! look at vendor error codes.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// One field-level problem found while validating input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collected field-level validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut e = Self::new();
        e.push(field, message);
        e
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn missing(&mut self, field: &str) {
        self.push(field, format!("{field} is required"));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        let parts: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("row decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("upstream provider {provider} failed: {message}")]
    Upstream { provider: String, message: String },

    #[error("repository operation `{operation}` failed: {source}")]
    Repository {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn upstream(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Upstream {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    pub fn repository(operation: &'static str, source: StoreError) -> Self {
        Self::Repository { operation, source }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Errors the caller caused (bad filters, invalid payloads, unknown ids).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::BadRequest(_) | Self::NotFound { .. } | Self::Duplicate { .. }
        )
    }
}
