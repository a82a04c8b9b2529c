//! Unified application error model for the orchestration layer.
//! One enum covers every failure the page flows, guards and side-channels can
//! surface; helpers keep construction terse at the call sites.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// No cached identity token matched the provider key shape.
    NotFound { code: String, message: String },
    /// An HTTP call to a hosted surface returned a non-success status.
    Request { code: String, message: String, status: u16 },
    /// The identity provider rejected an operation; `message` is surfaced
    /// verbatim wherever a flow displays errors.
    Provider { code: String, message: String },
    /// Accessor misuse (e.g. a session handle outliving its context).
    Config { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::NotFound { code, .. }
            | AppError::Request { code, .. }
            | AppError::Provider { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound { message, .. }
            | AppError::Request { message, .. }
            | AppError::Provider { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    /// HTTP status attached to the failure, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn request<C: Into<String>, M: Into<String>>(status: u16, code: C, msg: M) -> Self { AppError::Request { code: code.into(), message: msg.into(), status } }
    pub fn provider<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Provider { code: code.into(), message: msg.into() } }
    pub fn config<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(s) => AppError::Request { code: "request_failed".into(), message: err.to_string(), status: s.as_u16() },
            None => AppError::Internal { code: "transport_error".into(), message: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_keep_code_and_message() {
        let e = AppError::not_found("id_token_missing", "no cached identity token");
        assert_eq!(e.code_str(), "id_token_missing");
        assert_eq!(e.message(), "no cached identity token");
        assert_eq!(e.status(), None);

        let e = AppError::request(503, "status_fetch_failed", "upstream unavailable");
        assert_eq!(e.status(), Some(503));
        assert_eq!(e.code_str(), "status_fetch_failed");
    }

    #[test]
    fn display_joins_code_and_message() {
        let e = AppError::provider("provider_rejected", "Invalid password");
        assert_eq!(e.to_string(), "provider_rejected: Invalid password");
    }

    #[test]
    fn anyhow_maps_to_internal() {
        let e: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(e.code_str(), "internal_error");
        assert_eq!(e.message(), "boom");
    }
}
