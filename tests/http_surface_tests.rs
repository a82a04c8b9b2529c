//! HTTP-facing pieces against mock vendor endpoints: the health fetcher, the
//! provider-profile check, payment confirmation polling and the hosted
//! identity provider's error mapping.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use portico::cancel::CancelToken;
use portico::config::Config;
use portico::error::AppError;
use portico::flows::{route_for_profile, PaymentReturnFlow};
use portico::health;
use portico::provider::{HostedProvider, IdentityProvider};
use portico::routes;
use portico::storage::CredentialCache;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn test_config(addr: SocketAddr) -> Config {
    let base = format!("http://{}", addr);
    Config {
        api_base: base.clone(),
        provider_base: base.clone(),
        provider_api: base,
        push_host: format!("ws://{}", addr),
        payment_poll_ms: 10,
        payment_poll_attempts: 4,
    }
}

fn seeded_cache(token: &str) -> CredentialCache {
    let cache = CredentialCache::in_memory();
    cache.set("CognitoIdentityServiceProvider.app.alice.idToken", token);
    cache
}

async fn monitoring(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer tok-123") => (StatusCode::OK, Json(json!({"status": "ok", "uptime_s": 42}))),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "bad token"}))),
    }
}

#[tokio::test]
async fn health_fetcher_returns_the_parsed_body_on_success() {
    let addr = serve(Router::new().route("/monitoring_system", get(monitoring))).await;
    let cfg = test_config(addr);
    let cache = seeded_cache("tok-123");

    let body = health::fetch_status(&cfg, &cache).await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["uptime_s"], 42);
}

#[tokio::test]
async fn health_fetcher_attaches_the_failing_status() {
    let addr = serve(Router::new().route("/monitoring_system", get(monitoring))).await;
    let cfg = test_config(addr);
    let cache = seeded_cache("wrong-token");

    let err = health::fetch_status(&cfg, &cache).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn health_fetcher_propagates_a_missing_token() {
    let addr = serve(Router::new().route("/monitoring_system", get(monitoring))).await;
    let cfg = test_config(addr);
    let cache = CredentialCache::in_memory();

    let err = health::fetch_status(&cfg, &cache).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

async fn profile_endpoint(status: StatusCode) -> SocketAddr {
    serve(Router::new().route(
        "/service_provider",
        get(move || async move { (status, Json(json!({}))) }),
    ))
    .await
}

#[tokio::test]
async fn provider_check_routes_by_status() {
    let addr = profile_endpoint(StatusCode::OK).await;
    assert_eq!(route_for_profile(&test_config(addr), "tok").await, routes::PROVIDER_DASHBOARD);

    let addr = profile_endpoint(StatusCode::NOT_FOUND).await;
    assert_eq!(route_for_profile(&test_config(addr), "tok").await, routes::PROVIDER_REGISTER);

    let addr = profile_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
    assert_eq!(route_for_profile(&test_config(addr), "tok").await, routes::HOME);
}

#[tokio::test]
async fn provider_check_falls_back_home_on_network_failure() {
    // Nothing is listening on this address once the listener is dropped.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert_eq!(route_for_profile(&test_config(addr), "tok").await, routes::HOME);
}

async fn payment_status(
    State(hits): State<Arc<AtomicU32>>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> (StatusCode, Json<Value>) {
    assert_eq!(id, "pay_123");
    // Confirmed on the third poll; 404 before that (webhook not landed).
    let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
    if n >= 3 {
        (StatusCode::OK, Json(json!({"status": "confirmed"})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({})))
    }
}

#[tokio::test]
async fn payment_return_polls_until_confirmed_then_navigates() {
    let hits = Arc::new(AtomicU32::new(0));
    let app = Router::new()
        .route("/payments/{id}", get(payment_status))
        .with_state(hits.clone());
    let addr = serve(app).await;
    let cfg = test_config(addr);

    let mut flow = PaymentReturnFlow::from_query("?paymentId=pay_123");
    let nav = flow.run(&cfg, &CancelToken::new()).await;
    assert_eq!(nav.as_deref(), Some("/receipt/pay_123"));
    assert_eq!(hits.load(Ordering::SeqCst), 3, "stopped polling once confirmed");
}

#[tokio::test]
async fn payment_return_navigates_even_when_never_confirmed() {
    let app = Router::new().route(
        "/payments/{id}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({}))) }),
    );
    let addr = serve(app).await;
    let cfg = test_config(addr);

    let mut flow = PaymentReturnFlow::from_query("paymentId=pay_9");
    let nav = flow.run(&cfg, &CancelToken::new()).await;
    assert_eq!(nav.as_deref(), Some("/receipt/pay_9"));
}

#[tokio::test]
async fn payment_return_with_no_id_never_touches_the_network() {
    // An unroutable config would fail loudly if the flow polled anyway.
    let cfg = Config {
        api_base: "http://127.0.0.1:1".to_string(),
        provider_base: "http://127.0.0.1:1".to_string(),
        provider_api: "http://127.0.0.1:1".to_string(),
        push_host: "ws://127.0.0.1:1".to_string(),
        payment_poll_ms: 10,
        payment_poll_attempts: 4,
    };
    let mut flow = PaymentReturnFlow::from_query("");
    assert_eq!(flow.message(), Some("Missing payment id."));
    assert!(flow.run(&cfg, &CancelToken::new()).await.is_none());
}

async fn provider_app() -> SocketAddr {
    let app = Router::new()
        .route(
            "/user/current",
            get(|| async { Json(json!({"username": "alice", "attributes": {"email": "a@b.c"}})) }),
        )
        .route(
            "/session/current",
            get(|| async { Json(json!({"idToken": "tok-abc"})) }),
        )
        .route(
            "/challenge/new-password",
            post(|| async { (StatusCode::BAD_REQUEST, Json(json!({"message": "Invalid password"}))) }),
        )
        .route("/signup/confirm", post(|| async { Json(json!({})) }))
        .route(
            "/signup/resend",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, Json(json!({"message": "Too many requests"}))) }),
        );
    serve(app).await
}

#[tokio::test]
async fn hosted_provider_reads_user_and_session() {
    let addr = provider_app().await;
    let provider = HostedProvider::new(&format!("http://{}", addr)).unwrap();

    let user = provider.current_user().await.unwrap();
    assert_eq!(user.username, "alice");

    let session = provider.current_session().await.unwrap();
    assert_eq!(session.id_token, "tok-abc");
}

#[tokio::test]
async fn hosted_provider_surfaces_rejection_messages_verbatim() {
    let addr = provider_app().await;
    let provider = HostedProvider::new(&format!("http://{}", addr)).unwrap();

    let err = provider.complete_new_password("alice", "pw").await.unwrap_err();
    assert_eq!(err.message(), "Invalid password");

    let err = provider.resend_sign_up("a@b.c").await.unwrap_err();
    assert_eq!(err.message(), "Too many requests");

    provider.confirm_sign_up("a@b.c", "123456").await.unwrap();
}
