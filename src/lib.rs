// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod query;
pub mod repository;
pub mod transform;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregatedData, Aggregator};
pub use crate::api::{create_router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::AppError;
