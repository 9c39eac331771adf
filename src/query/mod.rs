// src/query/mod.rs
//! Filtering, sorting and pagination over HTTP query parameters.
//!
//! Two filter conventions are accepted side by side: named filters declared in
//! an [`EntitySchema`] (`minTemperature=20`) and suffix lookups on any schema
//! column (`temperature__gte=20`). Both produce a backend-neutral [`Criteria`].

pub mod criteria;
pub mod lookup;
pub mod pagination;
pub mod params;
pub mod schema;

pub use criteria::{Comparison, Condition, Criteria, SqlValue, TextMatch};
pub use lookup::{parse_lookup, Lookup, Operator};
pub use pagination::{FindOptions, Page, PaginationConfig, PaginationMeta, SortKey};
pub use params::{ParamValue, QueryParams};
pub use schema::{verbatim, Column, EntitySchema, FieldKind, FilterField};

use crate::error::AppError;

/// Everything a `find_all` needs, built from one request's parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageQuery {
    pub criteria: Criteria,
    pub options: FindOptions,
}

impl PageQuery {
    pub fn build(
        schema: &EntitySchema,
        params: &QueryParams,
        cfg: PaginationConfig,
    ) -> Result<Self, AppError> {
        Ok(Self {
            criteria: schema.build_criteria(params)?,
            options: FindOptions::from_params(params, schema, cfg)?,
        })
    }
}
