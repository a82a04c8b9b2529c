//! Identity provider seam.
//! The trait is the vendor boundary: page flows, guards and the session store
//! only ever see `IdentityProvider`. `HostedProvider` talks to the real
//! hosted endpoints; `StaticProvider` answers from canned state for tests and
//! the CLI's offline mode.

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Opaque authenticated-user record as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub attributes: Value,
}

/// Current provider session: the signed identity token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub id_token: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Currently authenticated user, or an error when nobody is signed in.
    async fn current_user(&self) -> AppResult<UserProfile>;
    /// Current session without forcing a refresh.
    async fn current_session(&self) -> AppResult<ProviderSession>;
    /// Answer a new-password challenge for the given username.
    async fn complete_new_password(&self, username: &str, new_password: &str) -> AppResult<()>;
    /// Confirm a signup with the emailed verification code.
    async fn confirm_sign_up(&self, email: &str, code: &str) -> AppResult<()>;
    /// Re-send the signup verification code.
    async fn resend_sign_up(&self, email: &str) -> AppResult<()>;
}

/// Hosted identity provider over its HTTP surface.
pub struct HostedProvider {
    base: Url,
    client: reqwest::Client,
}

impl HostedProvider {
    pub fn new(base: &str) -> AppResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| AppError::config("provider_base_invalid", format!("invalid provider base URL {:?}: {}", base, e)))?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()?;
        Ok(Self { base, client })
    }

    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let url = self.base.join(path).map_err(|e| AppError::config("provider_path_invalid", e.to_string()))?;
        let resp = self.client.get(url).send().await?;
        Self::unwrap_response(resp).await
    }

    async fn post_json(&self, path: &str, body: Value) -> AppResult<Value> {
        let url = self.base.join(path).map_err(|e| AppError::config("provider_path_invalid", e.to_string()))?;
        let resp = self.client.post(url).json(&body).send().await?;
        Self::unwrap_response(resp).await
    }

    // Non-success responses carry {"message": ...}; that message is what the
    // flows put in front of the user, so it travels verbatim.
    async fn unwrap_response(resp: reqwest::Response) -> AppResult<Value> {
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!({}));
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("provider request failed: HTTP {}", status));
            return Err(AppError::provider("provider_rejected", message));
        }
        Ok(body)
    }
}

#[async_trait]
impl IdentityProvider for HostedProvider {
    async fn current_user(&self) -> AppResult<UserProfile> {
        let body = self.get_json("/user/current").await?;
        serde_json::from_value(body)
            .map_err(|e| AppError::provider("provider_user_unreadable", e.to_string()))
    }

    async fn current_session(&self) -> AppResult<ProviderSession> {
        let body = self.get_json("/session/current").await?;
        let Some(id_token) = body.get("idToken").and_then(|t| t.as_str()) else {
            return Err(AppError::provider("provider_session_missing_token", "session response carried no idToken"));
        };
        Ok(ProviderSession { id_token: id_token.to_string() })
    }

    async fn complete_new_password(&self, username: &str, new_password: &str) -> AppResult<()> {
        self.post_json("/challenge/new-password", json!({"username": username, "newPassword": new_password})).await?;
        info!(target: "provider", "new-password challenge completed for {}", username);
        Ok(())
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> AppResult<()> {
        self.post_json("/signup/confirm", json!({"email": email, "code": code})).await?;
        info!(target: "provider", "signup confirmed for {}", email);
        Ok(())
    }

    async fn resend_sign_up(&self, email: &str) -> AppResult<()> {
        self.post_json("/signup/resend", json!({"email": email})).await?;
        Ok(())
    }
}

/// Canned provider for tests and offline runs. Fields are plain data: set
/// them up front, then hand the provider to the code under test.
#[derive(Default)]
pub struct StaticProvider {
    pub user: Option<UserProfile>,
    pub id_token: Option<String>,
    /// When set, challenge/confirm operations fail with this message.
    pub confirm_error: Option<String>,
    /// When set, resend fails with this message.
    pub resend_error: Option<String>,
}

impl StaticProvider {
    pub fn unauthenticated() -> Self { Self::default() }

    pub fn authenticated(username: &str, id_token: &str) -> Self {
        Self {
            user: Some(UserProfile { username: username.to_string(), attributes: json!({}) }),
            id_token: Some(id_token.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn current_user(&self) -> AppResult<UserProfile> {
        self.user.clone().ok_or_else(|| AppError::provider("no_current_user", "no authenticated user"))
    }

    async fn current_session(&self) -> AppResult<ProviderSession> {
        match &self.id_token {
            Some(token) => Ok(ProviderSession { id_token: token.clone() }),
            None => Err(AppError::provider("no_current_session", "no active session")),
        }
    }

    async fn complete_new_password(&self, _username: &str, _new_password: &str) -> AppResult<()> {
        match &self.confirm_error {
            Some(msg) => Err(AppError::provider("provider_rejected", msg.clone())),
            None => Ok(()),
        }
    }

    async fn confirm_sign_up(&self, _email: &str, _code: &str) -> AppResult<()> {
        match &self.confirm_error {
            Some(msg) => Err(AppError::provider("provider_rejected", msg.clone())),
            None => Ok(()),
        }
    }

    async fn resend_sign_up(&self, _email: &str) -> AppResult<()> {
        match &self.resend_error {
            Some(msg) => Err(AppError::provider("provider_rejected", msg.clone())),
            None => Ok(()),
        }
    }
}
