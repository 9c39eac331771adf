// src/query/lookup.rs
//! `field__operator` lookup keys.

use crate::error::AppError;

use super::schema::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Between,
    IsNull,
}

impl Operator {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix.to_ascii_lowercase().as_str() {
            "exact" | "eq" => Operator::Exact,
            "iexact" => Operator::IExact,
            "contains" => Operator::Contains,
            "icontains" => Operator::IContains,
            "startswith" => Operator::StartsWith,
            "istartswith" => Operator::IStartsWith,
            "endswith" => Operator::EndsWith,
            "iendswith" => Operator::IEndsWith,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "in" => Operator::In,
            "between" | "range" => Operator::Between,
            "isnull" => Operator::IsNull,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Exact => "exact",
            Operator::IExact => "iexact",
            Operator::Contains => "contains",
            Operator::IContains => "icontains",
            Operator::StartsWith => "startswith",
            Operator::IStartsWith => "istartswith",
            Operator::EndsWith => "endswith",
            Operator::IEndsWith => "iendswith",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::Between => "between",
            Operator::IsNull => "isnull",
        }
    }

    /// Operator applied when a lookup key carries no suffix: case-insensitive
    /// contains for text, exact match for everything else. Every caller uses
    /// this one rule.
    pub fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Operator::IContains,
            _ => Operator::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub field: String,
    pub operator: Option<Operator>,
}

impl Lookup {
    pub fn operator_for(&self, kind: FieldKind) -> Operator {
        self.operator.unwrap_or_else(|| Operator::default_for(kind))
    }
}

/// Split `temperature__gte` into field and operator. A key without `__` has no
/// explicit operator; an unknown suffix is a client error.
pub fn parse_lookup(key: &str) -> Result<Lookup, AppError> {
    match key.rsplit_once("__") {
        Some((field, suffix)) if !field.is_empty() => {
            let operator = Operator::from_suffix(suffix).ok_or_else(|| {
                AppError::bad_request(format!("unknown lookup operator `{suffix}` in `{key}`"))
            })?;
            Ok(Lookup {
                field: field.to_string(),
                operator: Some(operator),
            })
        }
        _ => Ok(Lookup {
            field: key.to_string(),
            operator: None,
        }),
    }
}
