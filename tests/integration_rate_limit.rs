mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::handler::Handler;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use carenet::middleware::pipeline::PipelineBuilder;
use carenet::state::AppState;
use carenet::store::MemoryStore;
use carenet_cache::{CacheError, CounterStore, WindowState};
use carenet_config::WindowLimit;
use carenet_core::Role;
use common::{Spy, body_json, seed_user, send, test_state, token_for};

/// A request arriving directly from `ip`, as `axum::serve` would record it.
fn from_ip(ip: &str, token: Option<&str>) -> Request<Body> {
    from_peer(ip, &[], token)
}

fn from_peer(peer: &str, headers: &[(&str, &str)], token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/limited");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let mut request = builder.body(Body::empty()).unwrap();
    let addr = SocketAddr::new(peer.parse().unwrap(), 40_000);
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

fn ip_limited(state: &AppState, spy: &Spy, limit: WindowLimit) -> Router {
    let pipeline = PipelineBuilder::new()
        .with_error_handler()
        .with_rate_limit("test", limit)
        .build();
    Router::new()
        .route("/limited", get(spy.handler().layer(pipeline.layer(state))))
        .with_state(state.clone())
}

#[tokio::test]
async fn test_sixth_request_in_window_is_rejected() {
    let (state, _store) = test_state();
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(5, 60_000));

    for expected_remaining in (0..5).rev() {
        let response = send(&app, from_ip("203.0.113.7", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            expected_remaining.to_string().as_str()
        );
    }

    let response = send(&app, from_ip("203.0.113.7", None)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body = body_json(response).await;
    assert_eq!(body["code"], "RATE_LIMITED");
    assert_eq!(body["error"], "Too many requests");

    assert_eq!(spy.calls(), 5);
}

#[tokio::test]
async fn test_clients_have_separate_budgets() {
    let (state, _store) = test_state();
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(1, 60_000));

    assert_eq!(send(&app, from_ip("10.0.0.1", None)).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, from_ip("10.0.0.1", None)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, from_ip("10.0.0.2", None)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rotating_forwarded_for_does_not_reset_budget() {
    let (state, _store) = test_state();
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(5, 60_000));

    let mut statuses = Vec::new();
    for i in 0..20 {
        let spoofed = format!("10.9.{}.{}", i / 250, i % 250 + 1);
        let request = from_peer(
            "203.0.113.50",
            &[("x-forwarded-for", spoofed.as_str())],
            None,
        );
        statuses.push(send(&app, request).await.status());
    }

    let passed = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(passed, 5);
    assert_eq!(spy.calls(), 5);
}

#[tokio::test]
async fn test_trusted_proxy_forwards_client_address() {
    let (mut state, _store) = test_state();
    state.rate_limit_config.trusted_proxies = vec!["10.0.0.254".parse().unwrap()];
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(1, 60_000));

    let via_proxy = |client: &str| {
        from_peer("10.0.0.254", &[("x-forwarded-for", client)], None)
    };

    assert_eq!(send(&app, via_proxy("198.51.100.1")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&app, via_proxy("198.51.100.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(&app, via_proxy("198.51.100.2")).await.status(), StatusCode::OK);

    // The same header from an untrusted peer names nobody but the peer.
    let direct = from_peer("192.0.2.77", &[("x-forwarded-for", "198.51.100.9")], None);
    assert_eq!(send(&app, direct).await.status(), StatusCode::OK);
    let direct = from_peer("192.0.2.77", &[("x-forwarded-for", "198.51.100.10")], None);
    assert_eq!(send(&app, direct).await.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_budget_returns_after_window() {
    let (state, _store) = test_state();
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(2, 60_000));

    for _ in 0..2 {
        assert_eq!(send(&app, from_ip("10.0.0.9", None)).await.status(), StatusCode::OK);
    }
    assert_eq!(
        send(&app, from_ip("10.0.0.9", None)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::advance(Duration::from_millis(30_000)).await;
    assert_eq!(
        send(&app, from_ip("10.0.0.9", None)).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::advance(Duration::from_millis(30_001)).await;
    assert_eq!(send(&app, from_ip("10.0.0.9", None)).await.status(), StatusCode::OK);
    assert_eq!(spy.calls(), 3);
}

#[tokio::test]
async fn test_unauthenticated_requests_spend_ip_budget() {
    let (state, store) = test_state();
    let user = seed_user(&store, Role::Guardian).await;
    let token = token_for(&state, &user);

    let pipeline = PipelineBuilder::new()
        .with_rate_limit("test", WindowLimit::new(3, 60_000))
        .with_roles(&[Role::Guardian])
        .build();
    let spy = Spy::default();
    let app = Router::new()
        .route("/limited", get(spy.handler().layer(pipeline.layer(&state))))
        .with_state(state.clone());

    for _ in 0..3 {
        assert_eq!(
            send(&app, from_ip("198.51.100.1", None)).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    // Throttling runs before authentication, so a valid token does not help.
    let response = send(&app, from_ip("198.51.100.1", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_identity_budget_is_per_principal() {
    let (state, store) = test_state();
    let alice = seed_user(&store, Role::Guardian).await;
    let bob = seed_user(&store, Role::Guardian).await;

    let pipeline = PipelineBuilder::new()
        .with_identity_rate_limit("identity", WindowLimit::new(2, 60_000))
        .build();
    assert_eq!(pipeline.stage_names(), vec!["auth", "identity_rate_limit"]);

    let spy = Spy::default();
    let app = Router::new()
        .route("/limited", get(spy.handler().layer(pipeline.layer(&state))))
        .with_state(state.clone());

    let alice_token = token_for(&state, &alice);
    for _ in 0..2 {
        assert_eq!(
            send(&app, from_ip("192.0.2.1", Some(&alice_token))).await.status(),
            StatusCode::OK
        );
    }
    assert_eq!(
        send(&app, from_ip("192.0.2.2", Some(&alice_token))).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // Same address, different principal.
    assert_eq!(
        send(&app, from_ip("192.0.2.1", Some(&token_for(&state, &bob)))).await.status(),
        StatusCode::OK
    );
    assert_eq!(spy.calls(), 3);
}

struct UnreachableCounters;

#[async_trait]
impl CounterStore for UnreachableCounters {
    async fn hit(&self, _key: &str, _window: Duration) -> Result<WindowState, CacheError> {
        Err(CacheError::UnexpectedReply("connection refused".to_string()))
    }

    async fn reset(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_unreachable_counter_store_fails_open() {
    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(UnreachableCounters));
    let spy = Spy::default();
    let app = ip_limited(&state, &spy, WindowLimit::new(1, 60_000));

    for _ in 0..3 {
        let response = send(&app, from_ip("10.1.1.1", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
    assert_eq!(spy.calls(), 3);
}
