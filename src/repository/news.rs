// src/repository/news.rs
//! News articles: table mapping, filter schema, sanitization and write-time checks.

use super::backend::RowReader;
use super::entity::Entity;
use super::sanitize::{is_http_url, sanitize_opt, sanitize_text};
use crate::error::{StoreError, ValidationError};
use crate::model::{NewsArticle, NewsRecord, DEFAULT_NEWS_PROVIDER};
use crate::query::{Column, EntitySchema, FieldKind, FilterField, Operator, SqlValue};

const COLUMNS: &[Column] = &[
    Column { name: "id", sql: "id", kind: FieldKind::Integer },
    Column { name: "title", sql: "title", kind: FieldKind::Text },
    Column { name: "description", sql: "description", kind: FieldKind::Text },
    Column { name: "content", sql: "content", kind: FieldKind::Text },
    Column { name: "url", sql: "url", kind: FieldKind::Text },
    Column { name: "imageUrl", sql: "image_url", kind: FieldKind::Text },
    Column { name: "publishedAt", sql: "published_at", kind: FieldKind::Date },
    Column { name: "sourceName", sql: "source_name", kind: FieldKind::Text },
    Column { name: "author", sql: "author", kind: FieldKind::Text },
    Column { name: "provider", sql: "provider", kind: FieldKind::Text },
    Column { name: "createdAt", sql: "created_at", kind: FieldKind::Date },
];

const FILTERS: &[FilterField] = &[
    FilterField::new(
        "query",
        &["title", "description", "content"],
        FieldKind::Text,
        Operator::IContains,
    ),
    FilterField::new("sourceName", &["source_name"], FieldKind::Text, Operator::IContains),
    FilterField::new("author", &["author"], FieldKind::Text, Operator::IContains),
    FilterField::new("fromDate", &["published_at"], FieldKind::Date, Operator::Gte),
    FilterField::new("toDate", &["published_at"], FieldKind::Date, Operator::Lte),
];

pub static NEWS_SCHEMA: EntitySchema = EntitySchema {
    entity: "news",
    columns: COLUMNS,
    filters: FILTERS,
    default_sort: ("published_at", true),
    stored_text,
};

/// Free-text columns are scrubbed on write; `url`, `image_url` and `provider`
/// are stored as given.
fn stored_text(column: &str, raw: &str) -> String {
    match column {
        "title" | "description" | "content" | "source_name" | "author" => sanitize_text(raw),
        _ => raw.to_string(),
    }
}

/// Scrub free-text fields and fill the default provider. URLs are only trimmed;
/// they are checked, never rewritten.
pub fn sanitize_article(mut a: NewsArticle) -> NewsArticle {
    a.title = sanitize_text(&a.title);
    a.description = sanitize_opt(a.description);
    a.content = sanitize_text(&a.content);
    a.source_name = sanitize_text(&a.source_name);
    a.author = sanitize_opt(a.author);
    a.url = a.url.trim().to_string();
    a.image_url = a
        .image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    if a.provider.trim().is_empty() {
        a.provider = DEFAULT_NEWS_PROVIDER.to_string();
    }
    a
}

pub fn validate_article(a: &NewsArticle) -> Result<(), ValidationError> {
    let mut errors = ValidationError::new();

    for (field, value) in [
        ("title", &a.title),
        ("content", &a.content),
        ("sourceName", &a.source_name),
        ("provider", &a.provider),
    ] {
        if value.trim().is_empty() {
            errors.missing(field);
        }
    }

    if a.url.trim().is_empty() {
        errors.missing("url");
    } else if !is_http_url(&a.url) {
        errors.push("url", "url must start with http:// or https://");
    }
    if let Some(image) = &a.image_url {
        if !is_http_url(image) {
            errors.push("imageUrl", "imageUrl must start with http:// or https://");
        }
    }

    errors.into_result()
}

impl Entity for NewsRecord {
    type Draft = NewsArticle;

    const NAME: &'static str = "news";
    const TABLE: &'static str = "news";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "content",
        "url",
        "image_url",
        "published_at",
        "source_name",
        "author",
        "provider",
    ];
    const HAS_UPDATED_AT: bool = false;
    const REQUIRED: &'static [&'static str] = &["title", "content", "url", "sourceName", "provider"];

    fn schema() -> &'static EntitySchema {
        &NEWS_SCHEMA
    }

    fn prepare(draft: NewsArticle) -> NewsArticle {
        sanitize_article(draft)
    }

    fn validate(draft: &NewsArticle) -> Result<(), ValidationError> {
        validate_article(draft)
    }

    fn bind(a: &NewsArticle) -> Vec<SqlValue> {
        vec![
            a.title.as_str().into(),
            a.description.clone().into(),
            a.content.as_str().into(),
            a.url.as_str().into(),
            a.image_url.clone().into(),
            a.published_at.map(|t| t.timestamp()).into(),
            a.source_name.as_str().into(),
            a.author.clone().into(),
            a.provider.as_str().into(),
        ]
    }

    fn unique_key(a: &NewsArticle) -> Option<String> {
        Some(a.url.clone())
    }

    fn from_row(r: &mut RowReader) -> Result<Self, StoreError> {
        let id = r.int()?;
        let article = NewsArticle {
            title: r.text()?,
            description: r.opt_text()?,
            content: r.text()?,
            url: r.text()?,
            image_url: r.opt_text()?,
            published_at: r.opt_timestamp()?,
            source_name: r.text()?,
            author: r.opt_text()?,
            provider: r.text()?,
        };
        Ok(NewsRecord {
            id,
            article,
            created_at: r.timestamp()?,
        })
    }
}
