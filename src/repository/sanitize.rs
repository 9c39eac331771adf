// src/repository/sanitize.rs
//! Best-effort scrubbing of free text before it is stored. Queries are always
//! parameterized; this only keeps markup out of what clients render.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<script\b[^>]*/?>").expect("script regex"));
static RE_JS_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("scheme regex"));
static RE_EVENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s*\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).expect("event attr regex")
});
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://\S+$").expect("url regex"));

fn strip_markup(input: &str) -> String {
    let s = RE_SCRIPT.replace_all(input, "");
    let s = RE_JS_SCHEME.replace_all(&s, "");
    RE_EVENT_ATTR.replace_all(&s, "").into_owned()
}

/// Strip `<script>` blocks, `javascript:` schemes and inline `on*=` handlers,
/// then backslash-escape quotes and backslashes.
///
/// Idempotent: stripping repeats until nothing matches, and a backslash that
/// already escapes `\`, `"` or `'` is kept as is. Stored text can therefore be
/// read back and saved again unchanged.
pub fn sanitize_text(input: &str) -> String {
    let mut s = strip_markup(input);
    loop {
        let next = strip_markup(&s);
        if next == s {
            break;
        }
        s = next;
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.trim().chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let escaped = chars.peek().copied().filter(|c| matches!(*c, '\\' | '"' | '\''));
            if let Some(next) = escaped {
                out.push(ch);
                out.push(next);
                chars.next();
                continue;
            }
        }
        if matches!(ch, '\\' | '"' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn sanitize_opt(input: Option<String>) -> Option<String> {
    input.map(|s| sanitize_text(&s)).filter(|s| !s.is_empty())
}

pub fn is_http_url(value: &str) -> bool {
    RE_URL.is_match(value.trim())
}
