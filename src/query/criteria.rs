// src/query/criteria.rs
//! Backend-neutral filter criteria and their rendering to parameterized SQL.
//!
//! Column names are `&'static str` taken from the entity schemas, so the only
//! user-controlled data that reaches SQL goes through bound parameters.

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: &'static str,
        cmp: Comparison,
        value: SqlValue,
    },
    Text {
        column: &'static str,
        mode: TextMatch,
        case_insensitive: bool,
        value: String,
    },
    In {
        column: &'static str,
        values: Vec<SqlValue>,
    },
    Between {
        column: &'static str,
        low: SqlValue,
        high: SqlValue,
    },
    IsNull {
        column: &'static str,
        negated: bool,
    },
    /// OR over the inner conditions.
    Any(Vec<Condition>),
}

/// Conjunction of conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    conditions: Vec<Condition>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// ` WHERE …` (or an empty string) plus positional parameters for `?` placeholders.
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        if self.conditions.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut params = Vec::new();
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|c| render(c, &mut params))
            .collect();
        (format!(" WHERE {}", parts.join(" AND ")), params)
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn render(condition: &Condition, params: &mut Vec<SqlValue>) -> String {
    match condition {
        Condition::Compare { column, cmp, value } => {
            params.push(value.clone());
            format!("{column} {} ?", cmp.sql())
        }
        Condition::Text {
            column,
            mode,
            case_insensitive: true,
            value,
        } => {
            let needle = escape_like(&value.to_lowercase());
            let pattern = match mode {
                TextMatch::Exact => needle,
                TextMatch::Contains => format!("%{needle}%"),
                TextMatch::StartsWith => format!("{needle}%"),
                TextMatch::EndsWith => format!("%{needle}"),
            };
            params.push(SqlValue::Text(pattern));
            format!("LOWER({column}) LIKE ? ESCAPE '\\'")
        }
        Condition::Text {
            column,
            mode,
            case_insensitive: false,
            value,
        } => match mode {
            TextMatch::Exact => {
                params.push(SqlValue::Text(value.clone()));
                format!("{column} = ?")
            }
            TextMatch::Contains => {
                params.push(SqlValue::Text(value.clone()));
                format!("instr({column}, ?) > 0")
            }
            TextMatch::StartsWith => {
                params.push(SqlValue::Text(value.clone()));
                params.push(SqlValue::Text(value.clone()));
                format!("substr({column}, 1, length(?)) = ?")
            }
            TextMatch::EndsWith => {
                params.push(SqlValue::Text(value.clone()));
                params.push(SqlValue::Text(value.clone()));
                format!("substr({column}, -length(?)) = ?")
            }
        },
        Condition::In { column, values } => {
            let marks = vec!["?"; values.len()].join(", ");
            params.extend(values.iter().cloned());
            format!("{column} IN ({marks})")
        }
        Condition::Between { column, low, high } => {
            params.push(low.clone());
            params.push(high.clone());
            format!("{column} BETWEEN ? AND ?")
        }
        Condition::IsNull { column, negated } => {
            if *negated {
                format!("{column} IS NOT NULL")
            } else {
                format!("{column} IS NULL")
            }
        }
        Condition::Any(inner) => {
            if inner.is_empty() {
                return "1 = 0".to_string();
            }
            let parts: Vec<String> = inner.iter().map(|c| render(c, params)).collect();
            format!("({})", parts.join(" OR "))
        }
    }
}
