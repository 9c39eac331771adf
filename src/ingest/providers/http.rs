// src/ingest/providers/http.rs
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::AppError;

const MAX_BODY_IN_ERROR: usize = 200;

pub fn build_client(timeout: Duration) -> Result<Client, AppError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Config(format!("building HTTP client: {e}")))
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_BODY_IN_ERROR {
        let head: String = body.chars().take(MAX_BODY_IN_ERROR).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

/// Send a GET and decode the JSON body. Non-2xx responses and undecodable
/// bodies become `Upstream` errors carrying a truncated body.
pub async fn get_json(provider: &str, request: RequestBuilder) -> Result<Value, AppError> {
    let res = request
        .send()
        .await
        .map_err(|e| AppError::upstream(provider, format!("request failed: {}", e.without_url())))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AppError::upstream(provider, format!("reading body: {}", e.without_url())))?;

    if !status.is_success() {
        return Err(AppError::upstream(
            provider,
            format!("status {status}: {}", truncate_body(&body)),
        ));
    }

    serde_json::from_str(&body)
        .map_err(|e| AppError::upstream(provider, format!("invalid JSON: {e}")))
}
