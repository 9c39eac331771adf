// src/query/schema.rs
//! Declarative field schemas and the one routine that turns query parameters
//! into [`Criteria`] with them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::criteria::{Comparison, Condition, Criteria, SqlValue, TextMatch};
use super::lookup::{parse_lookup, Operator};
use super::pagination::PAGINATION_KEYS;
use super::params::{ParamValue, QueryParams};
use crate::error::{AppError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Boolean,
    /// Stored as unix seconds.
    Date,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer",
            FieldKind::Boolean => "a boolean",
            FieldKind::Date => "a date",
        }
    }
}

/// A stored column that suffix lookups and `sort` may reference, either by its
/// API name (`feelsLike`) or its SQL name (`feels_like`).
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql: &'static str,
    pub kind: FieldKind,
}

/// A named filter parameter (`minTemperature`, `query`, …).
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub param: &'static str,
    /// Several columns are OR-ed together.
    pub columns: &'static [&'static str],
    pub kind: FieldKind,
    pub operator: Operator,
    pub required: bool,
    pub default: Option<&'static str>,
    pub allowed: &'static [&'static str],
}

impl FilterField {
    pub const fn new(
        param: &'static str,
        columns: &'static [&'static str],
        kind: FieldKind,
        operator: Operator,
    ) -> Self {
        Self {
            param,
            columns,
            kind,
            operator,
            required: false,
            default: None,
            allowed: &[],
        }
    }

    pub const fn allowed(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    pub entity: &'static str,
    pub columns: &'static [Column],
    pub filters: &'static [FilterField],
    /// SQL column and direction used when `sort` is absent.
    pub default_sort: (&'static str, bool),
    /// How a text column's value is written when stored. Text filter values
    /// go through it too, so they compare against the stored form.
    pub stored_text: fn(&str, &str) -> String,
}

/// `stored_text` for entities that keep text as given.
pub fn verbatim(_column: &str, raw: &str) -> String {
    raw.to_string()
}

impl EntitySchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name) || c.sql.eq_ignore_ascii_case(name))
    }

    pub fn filter(&self, param: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.param == param)
    }

    /// Build criteria from both filter conventions: named schema filters and
    /// `column__operator` lookups. Unknown keys are ignored.
    pub fn build_criteria(&self, params: &QueryParams) -> Result<Criteria, AppError> {
        let mut criteria = Criteria::new();
        let mut errors = ValidationError::new();

        for field in self.filters {
            let value = match params.get(field.param) {
                Some(v) if v.first().is_some_and(|s| !s.trim().is_empty()) => v.clone(),
                _ => match field.default {
                    Some(d) => ParamValue::Single(d.to_string()),
                    None => {
                        if field.required {
                            errors.missing(field.param);
                        }
                        continue;
                    }
                },
            };

            if !field.allowed.is_empty() {
                let ok = value.to_list().iter().all(|v| {
                    field
                        .allowed
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(v))
                });
                if !ok {
                    errors.push(
                        field.param,
                        format!("{} must be one of: {}", field.param, field.allowed.join(", ")),
                    );
                    continue;
                }
            }

            let mut per_column = Vec::with_capacity(field.columns.len());
            for column in field.columns {
                match self.condition_for(column, field.kind, field.operator, field.param, &value) {
                    Ok(c) => per_column.push(c),
                    Err(AppError::Validation(v)) => errors.errors.extend(v.errors),
                    Err(other) => return Err(other),
                }
            }
            match per_column.len() {
                0 => {}
                1 => criteria.push(per_column.remove(0)),
                _ => criteria.push(Condition::Any(per_column)),
            }
        }

        for (key, value) in params.iter() {
            if self.filter(key).is_some() || PAGINATION_KEYS.contains(&key) {
                continue;
            }
            let lookup = match parse_lookup(key) {
                Ok(l) => l,
                Err(e) => {
                    let known = key
                        .rsplit_once("__")
                        .is_some_and(|(field, _)| self.column(field).is_some());
                    if known {
                        return Err(e);
                    }
                    continue;
                }
            };
            let Some(column) = self.column(&lookup.field) else {
                continue;
            };
            let op = lookup.operator_for(column.kind);
            match self.condition_for(column.sql, column.kind, op, key, value) {
                Ok(c) => criteria.push(c),
                Err(AppError::Validation(v)) => errors.errors.extend(v.errors),
                Err(other) => return Err(other),
            }
        }

        errors.into_result()?;
        Ok(criteria)
    }

    fn condition_for(
        &self,
        column: &'static str,
        kind: FieldKind,
        op: Operator,
        key: &str,
        value: &ParamValue,
    ) -> Result<Condition, AppError> {
        if kind == FieldKind::Text && op != Operator::IsNull {
            let stored = value.map(|v| (self.stored_text)(column, v.trim()));
            return condition_for(column, kind, op, key, &stored);
        }
        condition_for(column, kind, op, key, value)
    }
}

/// Parse a date given as RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD`, or unix seconds.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Coerce one raw string into the SQL value stored for `kind`.
pub fn coerce(kind: FieldKind, raw: &str) -> Option<SqlValue> {
    let raw = raw.trim();
    match kind {
        FieldKind::Text => Some(SqlValue::Text(raw.to_string())),
        FieldKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(SqlValue::Real),
        FieldKind::Integer => raw.parse::<i64>().ok().map(SqlValue::Integer),
        FieldKind::Boolean => Some(SqlValue::Integer(i64::from(raw.eq_ignore_ascii_case("true")))),
        FieldKind::Date => parse_date(raw).map(|dt| SqlValue::Integer(dt.timestamp())),
    }
}

fn coerce_or_invalid(kind: FieldKind, key: &str, raw: &str) -> Result<SqlValue, AppError> {
    coerce(kind, raw).ok_or_else(|| {
        AppError::Validation(ValidationError::single(
            key,
            format!("{key} must be {}", kind.describe()),
        ))
    })
}

fn condition_for(
    column: &'static str,
    kind: FieldKind,
    op: Operator,
    key: &str,
    value: &ParamValue,
) -> Result<Condition, AppError> {
    let single = || value.first().map(str::trim).unwrap_or_default();
    let text = |mode: TextMatch, case_insensitive: bool| Condition::Text {
        column,
        mode,
        case_insensitive,
        value: single().to_string(),
    };

    let condition = match op {
        Operator::Exact if kind == FieldKind::Text => text(TextMatch::Exact, false),
        Operator::IExact => text(TextMatch::Exact, true),
        Operator::Contains => text(TextMatch::Contains, false),
        Operator::IContains => text(TextMatch::Contains, true),
        Operator::StartsWith => text(TextMatch::StartsWith, false),
        Operator::IStartsWith => text(TextMatch::StartsWith, true),
        Operator::EndsWith => text(TextMatch::EndsWith, false),
        Operator::IEndsWith => text(TextMatch::EndsWith, true),
        Operator::Exact | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let cmp = match op {
                Operator::Gt => Comparison::Gt,
                Operator::Gte => Comparison::Gte,
                Operator::Lt => Comparison::Lt,
                Operator::Lte => Comparison::Lte,
                _ => Comparison::Eq,
            };
            Condition::Compare {
                column,
                cmp,
                value: coerce_or_invalid(kind, key, single())?,
            }
        }
        Operator::In => {
            let items = value.to_list();
            if items.is_empty() {
                return Err(AppError::bad_request(format!(
                    "`{key}` expects a non-empty list of values"
                )));
            }
            let values = items
                .iter()
                .map(|v| coerce_or_invalid(kind, key, v))
                .collect::<Result<Vec<_>, _>>()?;
            Condition::In { column, values }
        }
        Operator::Between => {
            let items = value.to_list();
            let [low, high] = items.as_slice() else {
                return Err(AppError::bad_request(format!(
                    "`{key}` expects exactly two values, got {}",
                    items.len()
                )));
            };
            Condition::Between {
                column,
                low: coerce_or_invalid(kind, key, low)?,
                high: coerce_or_invalid(kind, key, high)?,
            }
        }
        Operator::IsNull => {
            let raw = single().to_ascii_lowercase();
            Condition::IsNull {
                column,
                negated: !matches!(raw.as_str(), "" | "true" | "1" | "yes"),
            }
        }
    };
    Ok(condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        Column { name: "city", sql: "city", kind: FieldKind::Text },
        Column { name: "temperature", sql: "temperature", kind: FieldKind::Number },
        Column { name: "humidity", sql: "humidity", kind: FieldKind::Integer },
        Column { name: "timestamp", sql: "timestamp", kind: FieldKind::Date },
    ];
    const FILTERS: &[FilterField] = &[
        FilterField::new("minTemperature", &["temperature"], FieldKind::Number, Operator::Gte),
        FilterField::new("provider", &["provider"], FieldKind::Text, Operator::IExact)
            .allowed(&["openweathermap", "accuweather"]),
        FilterField::new("search", &["city", "country"], FieldKind::Text, Operator::IContains),
    ];
    const SCHEMA: EntitySchema = EntitySchema {
        entity: "test",
        stored_text: verbatim,
        columns: COLUMNS,
        filters: FILTERS,
        default_sort: ("timestamp", true),
    };

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn named_filter_coerces_number() {
        let c = SCHEMA
            .build_criteria(&params(&[("minTemperature", "12.5")]))
            .unwrap();
        assert_eq!(
            c.conditions(),
            &[Condition::Compare {
                column: "temperature",
                cmp: Comparison::Gte,
                value: SqlValue::Real(12.5),
            }]
        );
    }

    #[test]
    fn non_numeric_value_is_a_validation_error() {
        let err = SCHEMA
            .build_criteria(&params(&[("minTemperature", "warm")]))
            .unwrap_err();
        match err {
            AppError::Validation(v) => assert!(v.has_field("minTemperature")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn allowed_values_are_enforced() {
        assert!(SCHEMA
            .build_criteria(&params(&[("provider", "AccuWeather")]))
            .is_ok());
        assert!(SCHEMA
            .build_criteria(&params(&[("provider", "weatherapi")]))
            .is_err());
    }

    #[test]
    fn multi_column_filter_becomes_or() {
        let c = SCHEMA.build_criteria(&params(&[("search", "vn")])).unwrap();
        assert!(matches!(&c.conditions()[0], Condition::Any(v) if v.len() == 2));
    }

    #[test]
    fn bare_column_uses_default_operator() {
        let c = SCHEMA
            .build_criteria(&params(&[("city", "hanoi"), ("humidity", "60")]))
            .unwrap();
        assert!(c.conditions().contains(&Condition::Text {
            column: "city",
            mode: TextMatch::Contains,
            case_insensitive: true,
            value: "hanoi".into(),
        }));
        assert!(c.conditions().contains(&Condition::Compare {
            column: "humidity",
            cmp: Comparison::Eq,
            value: SqlValue::Integer(60),
        }));
    }

    #[test]
    fn between_requires_two_values() {
        let ok = SCHEMA
            .build_criteria(&params(&[("temperature__between", "10,20")]))
            .unwrap();
        assert!(matches!(ok.conditions()[0], Condition::Between { .. }));

        let err = SCHEMA
            .build_criteria(&params(&[("temperature__between", "10")]))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn in_requires_values() {
        let err = SCHEMA
            .build_criteria(&params(&[("humidity__in", " , ")]))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_keys_are_ignored_but_bad_operators_on_known_columns_are_not() {
        let c = SCHEMA
            .build_criteria(&params(&[("colour", "red"), ("foo__bar", "1"), ("page", "2")]))
            .unwrap();
        assert!(c.is_empty());
        assert!(SCHEMA
            .build_criteria(&params(&[("city__near", "x")]))
            .is_err());
    }

    #[test]
    fn required_and_default_fields() {
        const REQ: &[FilterField] = &[
            FilterField::new("country", &["country"], FieldKind::Text, Operator::IExact).required(),
            FilterField::new("provider", &["provider"], FieldKind::Text, Operator::IExact)
                .default_value("openweathermap"),
        ];
        let schema = EntitySchema { filters: REQ, ..SCHEMA };
        let err = schema.build_criteria(&QueryParams::new()).unwrap_err();
        assert!(err.to_string().contains("country is required"));

        let c = schema
            .build_criteria(&params(&[("country", "VN")]))
            .unwrap();
        assert_eq!(c.conditions().len(), 2);
    }

    #[test]
    fn dates_accept_several_formats() {
        assert_eq!(parse_date("2024-01-02").unwrap().timestamp(), 1_704_153_600);
        assert_eq!(
            parse_date("2024-01-02T00:00:00Z").unwrap(),
            parse_date("1704153600").unwrap()
        );
        assert!(parse_date("tomorrow").is_none());
    }

    #[test]
    fn booleans_compare_against_true() {
        assert_eq!(coerce(FieldKind::Boolean, "TRUE"), Some(SqlValue::Integer(1)));
        assert_eq!(coerce(FieldKind::Boolean, "yes"), Some(SqlValue::Integer(0)));
    }
}
