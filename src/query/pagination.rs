// src/query/pagination.rs
//! Page/limit/offset/sort handling and the pagination metadata returned to clients.

use serde::{Deserialize, Serialize};

use super::params::QueryParams;
use super::schema::EntitySchema;
use crate::error::AppError;

/// Keys that control paging and never act as filters.
pub const PAGINATION_KEYS: &[&str] = &["page", "limit", "offset", "sort"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    /// Never negative.
    pub offset: i64,
    pub sort: Vec<SortKey>,
}

impl FindOptions {
    /// Read paging keys. Unparsable `page`/`limit` fall back to defaults and
    /// `limit` is clamped to `max_limit`. An explicit `offset` overrides the
    /// one derived from `page`, and `page` is then derived from it. Offsets
    /// SQLite cannot bind (negative, non-numeric, above `i64::MAX`) are rejected.
    pub fn from_params(
        params: &QueryParams,
        schema: &EntitySchema,
        cfg: PaginationConfig,
    ) -> Result<Self, AppError> {
        let max_limit = cfg.max_limit.max(1);
        let requested_page = params
            .get_str("page")
            .and_then(|p| p.parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let limit = params
            .get_str("limit")
            .and_then(|l| l.parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(cfg.default_limit)
            .clamp(1, max_limit);

        let (page, offset) = match params.get_str("offset").map(str::trim) {
            Some(raw) => {
                let offset = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|o| *o >= 0)
                    .ok_or_else(|| {
                        AppError::bad_request(format!(
                            "`offset` must be an integer between 0 and {}, got '{raw}'",
                            i64::MAX
                        ))
                    })?;
                let page = u32::try_from(offset / i64::from(limit) + 1).unwrap_or(u32::MAX);
                (page, offset)
            }
            None => {
                let offset = i64::from(requested_page - 1)
                    .checked_mul(i64::from(limit))
                    .ok_or_else(|| AppError::bad_request("`page` is too large"))?;
                (requested_page, offset)
            }
        };

        let mut sort = params
            .get_str("sort")
            .map(|s| parse_sort(s, schema))
            .unwrap_or_default();
        if sort.is_empty() {
            let (column, descending) = schema.default_sort;
            sort.push(SortKey { column, descending });
        }

        Ok(Self {
            page,
            limit,
            offset,
            sort,
        })
    }

    /// ` ORDER BY … LIMIT n OFFSET m`, with `id` as a stable tie-breaker.
    pub fn to_sql(&self) -> String {
        let mut order: Vec<String> = self
            .sort
            .iter()
            .map(|k| format!("{} {}", k.column, if k.descending { "DESC" } else { "ASC" }))
            .collect();
        if !self.sort.iter().any(|k| k.column == "id") {
            let dir = match self.sort.first() {
                Some(k) if !k.descending => "ASC",
                _ => "DESC",
            };
            order.push(format!("id {dir}"));
        }
        format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            order.join(", "),
            self.limit,
            self.offset
        )
    }
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PaginationConfig::default().default_limit,
            offset: 0,
            sort: Vec::new(),
        }
    }
}

/// `-temperature,city` or `temperature:desc,city:asc`. Unknown columns are skipped.
pub fn parse_sort(raw: &str, schema: &EntitySchema) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|part| {
            let (name, descending) = match part.split_once(':') {
                Some((name, dir)) => (name.trim(), dir.trim().eq_ignore_ascii_case("desc")),
                None => match part.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (part.trim_start_matches('+'), false),
                },
            };
            schema.column(name).map(|c| SortKey {
                column: c.sql,
                descending,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            total_items: total,
            total_pages,
            current_page: page,
            items_per_page: limit,
            has_next_page: u64::from(page) < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationMeta::default(),
        }
    }
}
