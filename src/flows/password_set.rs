//! Password-set flow: answer the provider's new-password challenge for a
//! username carried over from the previous navigation step.

use crate::cancel::CancelToken;
use crate::provider::IdentityProvider;
use crate::routes;

use super::FlowPhase;

/// Missing username is a precondition failure with its own terminal view,
/// outside the submit state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSetView {
    MissingUsername,
    Form,
}

pub struct PasswordSetFlow {
    username: Option<String>,
    phase: FlowPhase,
    error: Option<String>,
}

impl PasswordSetFlow {
    pub fn new(username: Option<String>) -> Self {
        Self { username, phase: FlowPhase::Idle, error: None }
    }

    pub fn view(&self) -> PasswordSetView {
        match self.username {
            Some(_) => PasswordSetView::Form,
            None => PasswordSetView::MissingUsername,
        }
    }

    pub fn phase(&self) -> FlowPhase { self.phase }

    /// Provider error message from the last failed submit, verbatim.
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }

    pub fn is_submitting(&self) -> bool { self.phase == FlowPhase::Submitting }

    /// Submit the new password. Success is navigation to the login page;
    /// there is no visible success state of its own. Failure surfaces the
    /// provider's message and leaves the form resubmittable.
    pub async fn submit(
        &mut self,
        provider: &dyn IdentityProvider,
        new_password: &str,
        cancel: &CancelToken,
    ) -> Option<String> {
        let Some(username) = self.username.clone() else { return None; };
        if !self.phase.accepts_submit() {
            return None;
        }
        self.phase = FlowPhase::Submitting;
        let result = provider.complete_new_password(&username, new_password).await;
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
}
