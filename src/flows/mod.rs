//! Page-scoped vendor flows: short state machines culminating in navigation
//! or a terminal message. Each flow owns only its own transient state; a new
//! submit is ignored while one is outstanding, and a fired cancel token
//! discards results instead of committing them.

mod password_set;
mod payment_return;
mod provider_check;
mod verify_email;

pub use password_set::{PasswordSetFlow, PasswordSetView};
pub use payment_return::{payment_id_from_query, PaymentReturnFlow, MISSING_PAYMENT_MESSAGE};
pub use provider_check::{route_for_profile, ProviderProfileCheck};
pub use verify_email::{EmailVerifyFlow, VerifyEmailView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    Submitting,
    Error,
    Success,
}

impl FlowPhase {
    /// Whether a new submit may start. Error counts as resubmittable; the
    /// error text stays up until the next attempt replaces it.
    pub fn accepts_submit(self) -> bool {
        matches!(self, FlowPhase::Idle | FlowPhase::Error)
    }
}
