//! Payment-return flow: the processor redirects back with a `paymentId`
//! query parameter; the flow confirms the payment against the backend and
//! then navigates to the receipt view. Confirmation is a bounded poll (the
//! webhook usually lands within a beat or two); exhausting the attempt
//! budget still navigates, leaving the pending display to the receipt view.

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::routes;

use super::FlowPhase;

pub const MISSING_PAYMENT_MESSAGE: &str = "Missing payment id.";

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// `paymentId` from a raw query string (with or without the leading `?`).
/// An absent key, an empty value or an undecodable value all count as
/// missing.
pub fn payment_id_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        if parts.next() != Some("paymentId") {
            continue;
        }
        let raw = parts.next().unwrap_or("");
        let Ok(decoded) = urlencoding::decode(raw) else { return None; };
        if decoded.is_empty() {
            return None;
        }
        return Some(decoded.into_owned());
    }
    None
}

pub struct PaymentReturnFlow {
    payment_id: Option<String>,
    phase: FlowPhase,
}

impl PaymentReturnFlow {
    pub fn from_query(query: &str) -> Self {
        Self { payment_id: payment_id_from_query(query), phase: FlowPhase::Idle }
    }

    pub fn payment_id(&self) -> Option<&str> { self.payment_id.as_deref() }
    pub fn phase(&self) -> FlowPhase { self.phase }

    /// Terminal inline message when the redirect carried no payment id.
    pub fn message(&self) -> Option<&'static str> {
        match self.payment_id {
            Some(_) => None,
            None => Some(MISSING_PAYMENT_MESSAGE),
        }
    }

    /// Confirm and navigate. With no payment id this is a no-op (the message
    /// view is terminal); otherwise the flow polls the backend for the
    /// payment record and returns the receipt route keyed by the id.
    pub async fn run(&mut self, cfg: &Config, cancel: &CancelToken) -> Option<String> {
        let Some(id) = self.payment_id.clone() else { return None; };
        if !self.phase.accepts_submit() {
            return None;
        }
        self.phase = FlowPhase::Submitting;
        let confirmed = wait_for_confirmation(cfg, &id, cancel).await;
        if cancel.is_cancelled() {
            return None;
        }
        if !confirmed {
            warn!(
                target: "flows",
                "payment {} unconfirmed after {} polls; continuing to receipt",
                id, cfg.payment_poll_attempts
            );
        }
        self.phase = FlowPhase::Success;
        Some(routes::receipt(&id))
    }
}

// Poll until the backend reports the payment confirmed, up to the configured
// attempt budget. A 404 means the webhook has not landed yet; transport
// errors are logged and count as a miss.
async fn wait_for_confirmation(cfg: &Config, payment_id: &str, cancel: &CancelToken) -> bool {
    let url = format!(
        "{}/payments/{}",
        cfg.api_base.trim_end_matches('/'),
        urlencoding::encode(payment_id)
    );
    for attempt in 0..cfg.payment_poll_attempts {
        if cancel.is_cancelled() {
            return false;
        }
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(cfg.payment_poll_ms)).await;
        }
        match HTTP.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: Value = resp.json().await.unwrap_or(json!({}));
                if body.get("status").and_then(|s| s.as_str()) == Some("confirmed") {
                    return true;
                }
            }
            Ok(_) => {} // not recorded yet
            Err(e) => warn!(target: "flows", "payment poll failed: {e}"),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parsing_finds_the_payment_id() {
        assert_eq!(payment_id_from_query("?paymentId=pay_123").as_deref(), Some("pay_123"));
        assert_eq!(payment_id_from_query("a=1&paymentId=pay_9&b=2").as_deref(), Some("pay_9"));
        assert_eq!(payment_id_from_query("paymentId=pay%20x").as_deref(), Some("pay x"));
    }

    #[test]
    fn missing_or_empty_id_is_none() {
        assert!(payment_id_from_query("").is_none());
        assert!(payment_id_from_query("?other=1").is_none());
        assert!(payment_id_from_query("?paymentId=").is_none());
    }

    #[test]
    fn missing_id_shows_the_terminal_message() {
        let flow = PaymentReturnFlow::from_query("?foo=bar");
        assert_eq!(flow.message(), Some(MISSING_PAYMENT_MESSAGE));
        assert_eq!(flow.phase(), FlowPhase::Idle);
    }
}
