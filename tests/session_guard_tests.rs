//! Session store and route guard behavior against a canned identity
//! provider: load/refresh commits, role extraction, fail-closed guards and
//! cancellation discards.

use std::sync::Arc;

use serde_json::json;

use portico::cancel::CancelToken;
use portico::claims;
use portico::guard::{Access, GuardView, RouteGuard};
use portico::provider::StaticProvider;
use portico::routes;
use portico::session::{SessionContext, DEFAULT_ROLE};

fn provider_token(role: &str) -> String {
    claims::unsigned_token(&json!({ "custom:role": role }))
}

fn admin_token() -> String {
    claims::unsigned_token(&json!({ "cognito:groups": ["Administrator"], "custom:role": "admin" }))
}

#[tokio::test]
async fn successful_load_commits_identity_token_and_role() {
    let token = provider_token("provider");
    let provider = Arc::new(StaticProvider::authenticated("alice", &token));
    let ctx = SessionContext::new(provider);

    assert!(ctx.snapshot().loading, "loading until the first load settles");

    let state = ctx.load(&CancelToken::new()).await;
    assert!(!state.loading);
    assert_eq!(state.role, "provider");
    assert_eq!(state.token.as_deref(), Some(token.as_str()));
    assert_eq!(state.identity.unwrap().username, "alice");
}

#[tokio::test]
async fn role_falls_back_to_customer_when_claim_is_absent() {
    let token = claims::unsigned_token(&json!({ "email": "a@b.c" }));
    let provider = Arc::new(StaticProvider::authenticated("alice", &token));
    let ctx = SessionContext::new(provider);

    let state = ctx.load(&CancelToken::new()).await;
    assert_eq!(state.role, DEFAULT_ROLE);
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn failed_load_commits_the_cleared_state() {
    let provider = Arc::new(StaticProvider::unauthenticated());
    let ctx = SessionContext::new(provider);

    let state = ctx.load(&CancelToken::new()).await;
    assert!(state.identity.is_none());
    assert!(state.token.is_none());
    assert_eq!(state.role, DEFAULT_ROLE);
    assert!(!state.loading, "a settled failure is not loading");
}

#[tokio::test]
async fn cancelled_load_discards_the_result() {
    let token = provider_token("provider");
    let provider = Arc::new(StaticProvider::authenticated("alice", &token));
    let ctx = SessionContext::new(provider);

    let cancel = CancelToken::new();
    cancel.cancel();
    ctx.load(&cancel).await;

    // Nothing committed: still the pre-load shape.
    let state = ctx.snapshot();
    assert!(state.token.is_none());
    assert!(state.identity.is_none());
}

#[tokio::test]
async fn handle_reads_live_state_and_fails_after_context_drop() {
    let token = provider_token("customer");
    let provider = Arc::new(StaticProvider::authenticated("alice", &token));
    let ctx = SessionContext::new(provider);
    let handle = ctx.handle();

    ctx.load(&CancelToken::new()).await;
    assert!(handle.read().unwrap().is_authenticated());

    drop(ctx);
    let err = handle.read().unwrap_err();
    assert_eq!(err.code_str(), "session_scope");
}

#[tokio::test]
async fn guard_allows_administrator_group_members() {
    let provider = StaticProvider::authenticated("root", &admin_token());
    let mut guard = RouteGuard::admin();

    let access = guard.check(&provider, &CancelToken::new()).await;
    assert_eq!(access, Access::Allowed);
    assert_eq!(guard.view(), GuardView::Content);
}

#[tokio::test]
async fn guard_denies_without_a_session_and_redirects_to_login() {
    let provider = StaticProvider::unauthenticated();
    let mut guard = RouteGuard::admin();
    assert_eq!(guard.view(), GuardView::Checking, "no redirect while Unknown");

    let access = guard.check(&provider, &CancelToken::new()).await;
    assert_eq!(access, Access::Denied);
    assert_eq!(guard.view(), GuardView::Redirect(routes::ADMIN_LOGIN.to_string()));
}

#[tokio::test]
async fn guard_denies_token_without_the_required_group() {
    let token = claims::unsigned_token(&json!({ "cognito:groups": ["Support"] }));
    let provider = StaticProvider::authenticated("bob", &token);
    let mut guard = RouteGuard::admin();

    assert_eq!(guard.check(&provider, &CancelToken::new()).await, Access::Denied);
}

#[tokio::test]
async fn guard_fails_closed_on_malformed_tokens() {
    let provider = StaticProvider::authenticated("bob", "not-a-jwt");
    let mut guard = RouteGuard::admin();

    assert_eq!(guard.check(&provider, &CancelToken::new()).await, Access::Denied);
}

#[tokio::test]
async fn authenticated_guard_accepts_any_valid_session() {
    let token = provider_token("customer");
    let provider = StaticProvider::authenticated("carol", &token);
    let mut guard = RouteGuard::authenticated();

    assert_eq!(guard.check(&provider, &CancelToken::new()).await, Access::Allowed);
}

#[tokio::test]
async fn cancelled_guard_check_stays_unknown() {
    let provider = StaticProvider::authenticated("root", &admin_token());
    let mut guard = RouteGuard::admin();

    let cancel = CancelToken::new();
    cancel.cancel();
    let access = guard.check(&provider, &cancel).await;
    assert_eq!(access, Access::Unknown);
    assert_eq!(guard.view(), GuardView::Checking);

    // A later, uncancelled check still settles normally.
    let access = guard.check(&provider, &CancelToken::new()).await;
    assert_eq!(access, Access::Allowed);
}

#[tokio::test]
async fn guard_decision_transitions_at_most_once() {
    let provider = StaticProvider::authenticated("root", &admin_token());
    let mut guard = RouteGuard::admin();
    assert_eq!(guard.check(&provider, &CancelToken::new()).await, Access::Allowed);

    // Even if the session disappears afterwards, the settled decision holds.
    let gone = StaticProvider::unauthenticated();
    assert_eq!(guard.check(&gone, &CancelToken::new()).await, Access::Allowed);
}
