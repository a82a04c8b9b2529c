//! Status snapshot fetcher for the dashboards.
//! One authenticated GET against the monitoring endpoint; the caller decides
//! what to do about failures; there is no retry here.

use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::storage::CredentialCache;
use crate::token;

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Fetch the monitoring snapshot using the cached identity token.
/// Propagates the token accessor's NotFound; a non-success response fails
/// with the HTTP status attached.
pub async fn fetch_status(cfg: &Config, cache: &CredentialCache) -> AppResult<Value> {
    let token = token::id_token(cache)?;
    let url = format!("{}/monitoring_system", cfg.api_base.trim_end_matches('/'));
    let resp = HTTP
        .get(&url)
        .bearer_auth(&token)
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::request(
            status.as_u16(),
            "status_fetch_failed",
            format!("monitoring endpoint returned HTTP {}", status),
        ));
    }
    let body: Value = resp.json().await?;
    Ok(body)
}
