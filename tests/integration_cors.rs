mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use carenet::router::init_router;
use carenet_core::Role;
use common::{ALLOWED_ORIGIN, body_bytes, body_json, seed_user, send, test_state, token_for};

fn with_origin(method: &str, uri: &str, origin: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, origin);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_preflight_is_answered_without_credentials() {
    let (state, _store) = test_state();
    let app = init_router(state);

    let uri = format!("/api/jobs/{}", uuid::Uuid::new_v4());
    let mut request = with_origin("OPTIONS", &uri, ALLOWED_ORIGIN, None);
    request.headers_mut().insert(
        header::ACCESS_CONTROL_REQUEST_METHOD,
        "GET".parse().unwrap(),
    );

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers().clone();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED_ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .contains("GET")
    );
    assert!(headers.get_all(header::VARY).iter().any(|v| v == "Origin"));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_preflight_on_every_route_skips_auth_and_budgets() {
    let (mut state, _store) = test_state();
    state.rate_limit_config.general = carenet_config::WindowLimit::new(1, 60_000);
    state.rate_limit_config.identity = carenet_config::WindowLimit::new(1, 60_000);
    let app = init_router(state);

    let id = uuid::Uuid::new_v4();
    let paths = [
        "/api/auth/me".to_string(),
        "/api/auth/refresh".to_string(),
        "/api/jobs".to_string(),
        format!("/api/jobs/{id}"),
        format!("/api/jobs/{id}/assign"),
        "/api/payments".to_string(),
        format!("/api/payments/{id}"),
        "/api/disputes".to_string(),
        format!("/api/disputes/{id}/resolve"),
        format!("/api/moderation/companies/{id}/verify"),
        format!("/api/moderation/caregivers/{id}/verify"),
    ];

    for path in &paths {
        for _ in 0..3 {
            let request = with_origin("OPTIONS", path, ALLOWED_ORIGIN, Some("not-a-jwt"));
            let response = send(&app, request).await;
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            assert!(!response.headers().contains_key("x-ratelimit-limit"), "{path}");
            assert_eq!(
                response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
                ALLOWED_ORIGIN
            );
        }
    }
}

#[tokio::test]
async fn test_allowed_origin_gets_cors_and_rate_limit_headers() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let token = token_for(&state, &guardian);
    let app = init_router(state);

    let response = send(
        &app,
        with_origin("GET", "/api/jobs", ALLOWED_ORIGIN, Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ALLOWED_ORIGIN
    );
    assert!(response.headers().contains_key("x-ratelimit-limit"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_unlisted_origin_gets_no_cors_headers() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let token = token_for(&state, &guardian);
    let app = init_router(state);

    let response = send(
        &app,
        with_origin("GET", "/api/jobs", "https://evil.example", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[tokio::test]
async fn test_unlisted_origin_rejected_before_authentication() {
    let (mut state, _store) = test_state();
    state.cors_config = state.cors_config.clone().rejecting_disallowed();
    let app = init_router(state);

    let response = send(
        &app,
        with_origin("POST", "/api/disputes", "https://evil.example", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN_ORIGIN");
    assert_eq!(body["error"], "Origin not allowed");
}
