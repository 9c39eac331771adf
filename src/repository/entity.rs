// src/repository/entity.rs
use serde::de::DeserializeOwned;
#[cfg(test)]
use serde_json::Value;

use crate::error::{StoreError, ValidationError};
use crate::query::{EntitySchema, SqlValue};

use super::backend::RowReader;

/// Mapping between a stored record type and its table.
///
/// Rows are selected as `id, COLUMNS…, created_at[, updated_at]`, and
/// [`Entity::from_row`] reads them back in that order.
pub trait Entity: Send + Sync + Sized + 'static {
    /// The not-yet-stored shape accepted by `create` and `update`.
    type Draft: Clone + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;
    const TABLE: &'static str;
    /// Writable columns, in the order [`Entity::bind`] produces values.
    const COLUMNS: &'static [&'static str];
    const HAS_UPDATED_AT: bool;
    /// JSON keys a draft payload must carry.
    const REQUIRED: &'static [&'static str];

    fn schema() -> &'static EntitySchema;

    /// Normalize input before validation and storage.
    fn prepare(draft: Self::Draft) -> Self::Draft {
        draft
    }

    fn validate(draft: &Self::Draft) -> Result<(), ValidationError>;

    fn bind(draft: &Self::Draft) -> Vec<SqlValue>;

    /// Natural key reported in duplicate errors.
    fn unique_key(_draft: &Self::Draft) -> Option<String> {
        None
    }

    fn from_row(row: &mut RowReader) -> Result<Self, StoreError>;

    fn select_list() -> String {
        let mut cols = Vec::with_capacity(Self::COLUMNS.len() + 3);
        cols.push("id");
        cols.extend_from_slice(Self::COLUMNS);
        cols.push("created_at");
        if Self::HAS_UPDATED_AT {
            cols.push("updated_at");
        }
        cols.join(", ")
    }
}

/// Build a draft from a JSON payload, naming every missing field before
/// attempting to decode it.
#[cfg(test)]
pub(crate) fn draft_from_json<E: Entity>(value: &Value) -> Result<E::Draft, ValidationError> {
    let mut errors = ValidationError::new();
    for field in E::REQUIRED {
        let present = match value.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            errors.missing(field);
        }
    }
    errors.into_result()?;

    let draft: E::Draft = serde_json::from_value(value.clone())
        .map_err(|e| ValidationError::single("payload", format!("invalid {}: {e}", E::NAME)))?;
    let draft = E::prepare(draft);
    E::validate(&draft)?;
    Ok(draft)
}
