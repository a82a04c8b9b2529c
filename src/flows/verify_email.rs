//! Email-verification flow: confirm a signup with the emailed code, with a
//! separate resend action independent of the code field.

use tracing::warn;

use crate::cancel::CancelToken;
use crate::error::{AppError, AppResult};
use crate::provider::IdentityProvider;
use crate::routes;

use super::FlowPhase;

/// A missing email short-circuits straight back to the signup entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyEmailView {
    Redirect(String),
    Form,
}

pub struct EmailVerifyFlow {
    email: Option<String>,
    phase: FlowPhase,
    error: Option<String>,
}

impl EmailVerifyFlow {
    pub fn new(email: Option<String>) -> Self {
        Self { email, phase: FlowPhase::Idle, error: None }
    }

    pub fn view(&self) -> VerifyEmailView {
        match self.email {
            Some(_) => VerifyEmailView::Form,
            None => VerifyEmailView::Redirect(routes::SIGNUP.to_string()),
        }
    }

    pub fn phase(&self) -> FlowPhase { self.phase }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }

    /// Confirm the signup with the entered code. Success navigates to login;
    /// failure shows the provider message inline and allows resubmission.
    pub async fn submit(
        &mut self,
        provider: &dyn IdentityProvider,
        code: &str,
        cancel: &CancelToken,
    ) -> Option<String> {
        let Some(email) = self.email.clone() else { return None; };
        if !self.phase.accepts_submit() {
            return None;
        }
        self.phase = FlowPhase::Submitting;
        let result = provider.confirm_sign_up(&email, code).await;
        if cancel.is_cancelled() {
            return None;
        }
        match result {
            Ok(()) => {
                self.phase = FlowPhase::Success;
                self.error = None;
                Some(routes::LOGIN.to_string())
            }
            Err(e) => {
                self.error = Some(e.message().to_string());
                self.phase = FlowPhase::Error;
                None
            }
        }
    }

    /// Re-send the verification code. Independent of the code field and of
    /// the submit machine; the failure comes back to the caller, who decides
    /// whether to show it.
    pub async fn resend(&self, provider: &dyn IdentityProvider) -> AppResult<()> {
        let Some(email) = self.email.as_deref() else {
            return Err(AppError::config("resend_without_email", "resend requested on a flow with no email"));
        };
        let result = provider.resend_sign_up(email).await;
        if let Err(e) = &result {
            warn!(target: "flows", "resend for {} failed: {e}", email);
        }
        result
    }
}
