// src/query/params.rs
//! Loosely-typed HTTP query parameters.

use std::collections::BTreeMap;

/// A query value: one string, or several when the key repeats (`a=1&a=2`) or
/// uses the `key[]` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s.as_str()),
            ParamValue::Many(v) => v.first().map(String::as_str),
        }
    }

    /// Values as a list. A single value is split on commas so `in`/`between`
    /// accept `a,b` as well as repeated keys. Blank items are dropped.
    pub fn to_list(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            ParamValue::Single(s) => s.split(',').collect(),
            ParamValue::Many(v) => v.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Apply `f` to every value.
    pub fn map(&self, f: impl Fn(&str) -> String) -> ParamValue {
        match self {
            ParamValue::Single(s) => ParamValue::Single(f(s)),
            ParamValue::Many(v) => ParamValue::Many(v.iter().map(|s| f(s)).collect()),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            ParamValue::Single(first) => {
                *self = ParamValue::Many(vec![std::mem::take(first), value]);
            }
            ParamValue::Many(v) => v.push(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    inner: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for (k, v) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let key = k.trim();
            if key.is_empty() {
                continue;
            }
            match key.strip_suffix("[]") {
                Some(base) => params.append_many(base, v.into_owned()),
                None => params.append(key, v.into_owned()),
            }
        }
        params
    }

    pub fn append(&mut self, key: &str, value: String) {
        match self.inner.get_mut(key) {
            Some(existing) => existing.push(value),
            None => {
                self.inner
                    .insert(key.to_string(), ParamValue::Single(value));
            }
        }
    }

    fn append_many(&mut self, key: &str, value: String) {
        match self.inner.get_mut(key) {
            Some(existing) => existing.push(value),
            None => {
                self.inner
                    .insert(key.to_string(), ParamValue::Many(vec![value]));
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.inner.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.inner.get(key)
    }

    /// First value for `key`, blank values treated as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(ParamValue::first)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy of the parameters whose keys satisfy `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        Self {
            inner: self
                .inner
                .iter()
                .filter(|(k, _)| keep(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.append(&k.into(), v.into());
        }
        params
    }
}
