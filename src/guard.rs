//! Route guards gating protected pages on an authorization check.
//!
//! Each guard instance is a one-shot state machine {Unknown} → {Allowed |
//! Denied}. While Unknown it renders a neutral checking placeholder and never
//! redirects (redirecting before the check settles would flash-redirect
//! authorized users). Denied is terminal and renders a redirect to the fixed
//! login route; Allowed is terminal and renders the protected content. Every
//! failure path (no session, network error, malformed token) lands on
//! Denied: guards fail closed.

use tracing::warn;

use crate::cancel::CancelToken;
use crate::claims;
use crate::provider::IdentityProvider;
use crate::routes;

/// Group whose members may enter the admin dashboard.
pub const ADMIN_GROUP: &str = "Administrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Unknown,
    Allowed,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any valid session is enough.
    Authenticated,
    /// The token's group claims must contain this group.
    Group(String),
}

/// What the guard asks the host to render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    Checking,
    Content,
    Redirect(String),
}

pub struct RouteGuard {
    requirement: Requirement,
    login_route: String,
    access: Access,
}

impl RouteGuard {
    pub fn new(requirement: Requirement, login_route: &str) -> Self {
        Self { requirement, login_route: login_route.to_string(), access: Access::Unknown }
    }

    /// Admin-dashboard guard: Administrator group, admin login on denial.
    pub fn admin() -> Self {
        Self::new(Requirement::Group(ADMIN_GROUP.to_string()), routes::ADMIN_LOGIN)
    }

    /// Signed-in guard for the non-admin dashboards.
    pub fn authenticated() -> Self {
        Self::new(Requirement::Authenticated, routes::LOGIN)
    }

    pub fn access(&self) -> Access { self.access }

    /// Run the authorization check. The transition out of Unknown happens at
    /// most once; later calls return the settled decision without touching
    /// the provider. A fired cancel token discards the result: the guard
    /// stays Unknown and commits nothing.
    pub async fn check(&mut self, provider: &dyn IdentityProvider, cancel: &CancelToken) -> Access {
        if self.access != Access::Unknown {
            return self.access;
        }
        let decided = Self::evaluate(provider, &self.requirement).await;
        if cancel.is_cancelled() {
            return Access::Unknown;
        }
        self.access = decided;
        decided
    }

    async fn evaluate(provider: &dyn IdentityProvider, requirement: &Requirement) -> Access {
        // Current session only; a forced refresh here would hide expiry from
        // the rest of the page.
        let session = match provider.current_session().await {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "guard", "session check failed, denying: {e}");
                return Access::Denied;
            }
        };
        if session.id_token.is_empty() {
            return Access::Denied;
        }
        match requirement {
            Requirement::Authenticated => Access::Allowed,
            Requirement::Group(group) => {
                if claims::group_claims(&session.id_token).iter().any(|g| g == group) {
                    Access::Allowed
                } else {
                    Access::Denied
                }
            }
        }
    }

    pub fn view(&self) -> GuardView {
        match self.access {
            Access::Unknown => GuardView::Checking,
            Access::Allowed => GuardView::Content,
            Access::Denied => GuardView::Redirect(self.login_route.clone()),
        }
    }
}
