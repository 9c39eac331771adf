// src/ingest/providers/newsapi.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::get_json;
use crate::error::AppError;
use crate::ingest::types::NewsSource;
use crate::model::DEFAULT_NEWS_PROVIDER;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const PAGE_SIZE: &str = "50";

pub struct NewsApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl NewsApiClient {
    pub fn new(api_key: impl Into<String>, http: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    fn name(&self) -> &'static str {
        DEFAULT_NEWS_PROVIDER
    }

    async fn fetch_top_headlines(
        &self,
        category: &str,
        country: Option<&str>,
    ) -> Result<Value, AppError> {
        let mut query = vec![
            ("apiKey", self.api_key.as_str()),
            ("category", category),
            ("pageSize", PAGE_SIZE),
        ];
        if let Some(c) = country {
            query.push(("country", c));
        }
        let request = self
            .http
            .get(format!("{}/top-headlines", self.base_url))
            .query(&query);
        get_json(self.name(), request).await
    }
}
