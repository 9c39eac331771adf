// src/transform/location.rs
//! City and country normalization backed by static alias tables.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static CITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("hcm", "Ho Chi Minh"),
        ("hcmc", "Ho Chi Minh"),
        ("tphcm", "Ho Chi Minh"),
        ("saigon", "Ho Chi Minh"),
        ("sai gon", "Ho Chi Minh"),
        ("ho chi minh city", "Ho Chi Minh"),
        ("thanh pho ho chi minh", "Ho Chi Minh"),
        ("hn", "Hanoi"),
        ("ha noi", "Hanoi"),
        ("da nang", "Da Nang"),
        ("danang", "Da Nang"),
        ("nyc", "New York"),
        ("new york city", "New York"),
        ("la", "Los Angeles"),
        ("sf", "San Francisco"),
        ("frisco", "San Francisco"),
        ("bkk", "Bangkok"),
        ("krung thep", "Bangkok"),
        ("peking", "Beijing"),
        ("bombay", "Mumbai"),
        ("calcutta", "Kolkata"),
    ])
});

static COUNTRY_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("vietnam", "VN"),
        ("viet nam", "VN"),
        ("socialist republic of vietnam", "VN"),
        ("united states", "US"),
        ("united states of america", "US"),
        ("usa", "US"),
        ("america", "US"),
        ("united kingdom", "GB"),
        ("great britain", "GB"),
        ("uk", "GB"),
        ("england", "GB"),
        ("japan", "JP"),
        ("south korea", "KR"),
        ("korea, republic of", "KR"),
        ("republic of korea", "KR"),
        ("china", "CN"),
        ("people's republic of china", "CN"),
        ("thailand", "TH"),
        ("singapore", "SG"),
        ("malaysia", "MY"),
        ("indonesia", "ID"),
        ("philippines", "PH"),
        ("india", "IN"),
        ("australia", "AU"),
        ("france", "FR"),
        ("germany", "DE"),
        ("deutschland", "DE"),
        ("italy", "IT"),
        ("spain", "ES"),
        ("canada", "CA"),
        ("brazil", "BR"),
        ("mexico", "MX"),
        ("russia", "RU"),
        ("russian federation", "RU"),
    ])
});

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize the first letter of every word; hyphen and apostrophe start a new word.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = matches!(ch, ' ' | '-' | '\'');
    }
    out
}

/// Title-case a city name, resolving well-known aliases first.
pub fn normalize_city(raw: &str) -> String {
    let collapsed = collapse_ws(raw);
    if collapsed.is_empty() {
        return collapsed;
    }
    let key = collapsed.to_lowercase();
    match CITY_ALIASES.get(key.as_str()) {
        Some(alias) => (*alias).to_string(),
        None => title_case(&key),
    }
}

/// Map a country name or provider code to ISO-3166 alpha-2.
/// Two-letter codes are upper-cased; anything unmapped passes through unchanged.
pub fn normalize_country(raw: &str) -> String {
    let trimmed = raw.trim();
    let key = collapse_ws(trimmed).to_lowercase();
    if let Some(code) = COUNTRY_CODES.get(key.as_str()) {
        return (*code).to_string();
    }
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return trimmed.to_ascii_uppercase();
    }
    trimmed.to_string()
}
