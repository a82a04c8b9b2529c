//! Provider-profile existence check, run once when the authentication state
//! settles: an existing profile goes to the dashboard, a missing one to
//! registration, anything anomalous to the home route.

use once_cell::sync::Lazy;
use tracing::warn;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::routes;
use crate::session::SessionState;

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Destination for the given bearer token: 200 → dashboard, 404 → register,
/// any other status or a network failure → home, with the anomaly logged.
pub async fn route_for_profile(cfg: &Config, token: &str) -> String {
    let url = format!("{}/service_provider", cfg.provider_api.trim_end_matches('/'));
    let dest = match HTTP.get(&url).bearer_auth(token).send().await {
        Ok(resp) => match resp.status().as_u16() {
            200 => routes::PROVIDER_DASHBOARD,
            404 => routes::PROVIDER_REGISTER,
            status => {
                warn!(target: "flows", "service_provider returned HTTP {}, falling back", status);
                routes::HOME
            }
        },
        Err(e) => {
            warn!(target: "flows", "service_provider check failed: {e}");
            routes::HOME
        }
    };
    dest.to_string()
}

/// One-shot wrapper: runs at most once per authentication settle. `reset`
/// re-arms it when the session is re-loaded.
pub struct ProviderProfileCheck {
    ran: bool,
}

impl ProviderProfileCheck {
    pub fn new() -> Self { Self { ran: false } }

    pub fn has_run(&self) -> bool { self.ran }

    pub fn reset(&mut self) { self.ran = false; }

    /// Run the check if the session is authenticated and it has not run yet.
    /// Returns the navigation target, or None when there is nothing to do
    /// (not authenticated, already ran, or cancelled).
    pub async fn run(&mut self, cfg: &Config, session: &SessionState, cancel: &CancelToken) -> Option<String> {
        if self.ran {
            return None;
        }
        let Some(token) = session.token.as_deref() else { return None; };
        self.ran = true;
        let dest = route_for_profile(cfg, token).await;
        if cancel.is_cancelled() {
            return None;
        }
        Some(dest)
    }
}

impl Default for ProviderProfileCheck {
    fn default() -> Self { Self::new() }
}
