// src/transform/newsapi.rs
//! NewsAPI `top-headlines` / `everything` responses.
//!
//! Without a paid plan NewsAPI returns partial articles whose `content` is
//! null. Those are dropped here, never stored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{decode, Transformer};
use crate::error::ValidationError;
use crate::model::{NewsArticle, DEFAULT_NEWS_PROVIDER};

const REMOVED: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: RawSource,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

fn clean(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

fn clean_opt(s: Option<String>) -> Option<String> {
    s.map(|v| clean(&v)).filter(|v| !v.is_empty())
}

fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NewsApiTransformer;

impl Transformer for NewsApiTransformer {
    type Output = Vec<NewsArticle>;

    fn provider(&self) -> &'static str {
        DEFAULT_NEWS_PROVIDER
    }

    fn validate(&self, raw: &Value) -> bool {
        raw.get("status").and_then(Value::as_str) == Some("ok")
            && raw.get("articles").is_some_and(Value::is_array)
    }

    fn transform(&self, raw: &Value) -> Result<Vec<NewsArticle>, ValidationError> {
        let parsed: NewsApiResponse = decode(self.provider(), raw)?;
        let mut out = Vec::with_capacity(parsed.articles.len());

        for a in parsed.articles {
            let Some(content) = a.content else {
                continue;
            };
            let (Some(title), Some(url)) = (a.title, a.url) else {
                continue;
            };
            // takedown placeholders
            if title.trim() == REMOVED || content.trim() == REMOVED {
                continue;
            }
            let published_at = match a.published_at.as_deref() {
                Some(raw_ts) => match parse_published_at(raw_ts) {
                    Some(ts) => Some(ts),
                    None => {
                        tracing::warn!(target: "ingest", %url, published_at = raw_ts, "dropping article with unparsable publishedAt");
                        continue;
                    }
                },
                None => None,
            };

            out.push(NewsArticle {
                title: clean(&title),
                description: clean_opt(a.description),
                content: clean(&content),
                url: url.trim().to_string(),
                image_url: a
                    .url_to_image
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty()),
                published_at,
                source_name: clean_opt(a.source.name).unwrap_or_else(|| "Unknown".to_string()),
                author: clean_opt(a.author),
                provider: DEFAULT_NEWS_PROVIDER.to_string(),
            });
        }

        Ok(out)
    }
}
