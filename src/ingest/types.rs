// src/ingest/types.rs
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::model::WeatherProvider;

/// Current-conditions source for one weather provider. Returns the raw
/// provider payload; normalization happens in the pipeline.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn provider(&self) -> WeatherProvider;

    async fn fetch_current(&self, city: &str) -> Result<Value, AppError>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_top_headlines(
        &self,
        category: &str,
        country: Option<&str>,
    ) -> Result<Value, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Stored { id: i64 },
    Skipped { reason: String },
    Failed { error: String },
}

/// What happened to one city or one article during an ingest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    /// City name, article URL, or provider name for whole-branch failures.
    pub key: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ItemResult {
    pub fn stored(key: impl Into<String>, id: i64) -> Self {
        Self {
            key: key.into(),
            outcome: Outcome::Stored { id },
        }
    }

    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(key: impl Into<String>, error: &AppError) -> Self {
        Self {
            key: key.into(),
            outcome: Outcome::Failed {
                error: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub weather: Vec<ItemResult>,
    pub news: Vec<ItemResult>,
}

impl IngestReport {
    fn all(&self) -> impl Iterator<Item = &ItemResult> {
        self.weather.iter().chain(self.news.iter())
    }

    pub fn stored(&self) -> usize {
        self.all()
            .filter(|r| matches!(r.outcome, Outcome::Stored { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.all()
            .filter(|r| matches!(r.outcome, Outcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.all()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
            .count()
    }
}
