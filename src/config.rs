//! Environment-driven configuration for the hosted vendor surfaces.
//! Every knob has a hard default so the crate runs against the production
//! deployment out of the box; tests construct the struct directly.

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API (`/monitoring_system`, `/payments/{id}`).
    pub api_base: String,
    /// Base URL of the hosted identity provider endpoints.
    pub provider_base: String,
    /// Base URL of the provider-profile API (`/service_provider`).
    pub provider_api: String,
    /// Push endpoint host; a bare host gets `wss://` prepended, a `ws://` or
    /// `wss://` value is used as-is.
    pub push_host: String,
    /// Interval between payment-confirmation polls, in milliseconds.
    pub payment_poll_ms: u64,
    /// Upper bound on payment-confirmation polls before navigating anyway.
    pub payment_poll_attempts: u32,
}

impl Config {
    pub fn from_env() -> Self {
        let api_base = std::env::var("PORTICO_API_BASE").unwrap_or_else(|_| "https://api.portico.dev".to_string());
        let provider_base = std::env::var("PORTICO_PROVIDER_BASE").unwrap_or_else(|_| "https://auth.portico.dev".to_string());
        let provider_api = std::env::var("PORTICO_PROVIDER_API").unwrap_or_else(|_| api_base.clone());
        let push_host = std::env::var("PORTICO_PUSH_HOST").unwrap_or_else(|_| "push.portico.dev".to_string());
        let payment_poll_ms = std::env::var("PORTICO_PAYMENT_POLL_MS").ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(1500);
        let payment_poll_attempts = std::env::var("PORTICO_PAYMENT_POLL_ATTEMPTS").ok().and_then(|s| s.parse::<u32>().ok()).unwrap_or(8);
        Self { api_base, provider_base, provider_api, push_host, payment_poll_ms, payment_poll_attempts }
    }
}
