mod common;

use axum::Router;
use axum::handler::Handler;
use axum::http::{StatusCode, header};
use axum::routing::get;
use carenet::middleware::auth::AuthUser;
use carenet::middleware::pipeline::{Pipeline, PipelineBuilder};
use carenet::state::AppState;
use carenet::store::User;
use carenet_auth::create_access_token;
use carenet_core::Role;
use common::{
    Spy, body_bytes, body_json, get as get_request, seed_user, send, test_state, token_for,
};

fn guarded(state: &AppState, spy: &Spy, pipeline: &Pipeline) -> Router {
    Router::new()
        .route("/guarded", get(spy.handler().layer(pipeline.layer(state))))
        .with_state(state.clone())
}

fn roles_pipeline(allowed: &[Role]) -> Pipeline {
    PipelineBuilder::new()
        .with_request_logging()
        .with_error_handler()
        .with_roles(allowed)
        .build()
}

#[tokio::test]
async fn test_missing_credential_never_reaches_handler() {
    let (state, _store) = test_state();
    let spy = Spy::default();
    let app = guarded(&state, &spy, &roles_pipeline(&Role::all()));

    let response = send(&app, get_request("/guarded", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(body["error"], "Access token is required");

    let response = send(&app, get_request("/guarded", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_CREDENTIAL");

    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_role_matrix() {
    let (state, store) = test_state();

    let mut users = Vec::new();
    for role in Role::all() {
        let user = seed_user(&store, role).await;
        let token = token_for(&state, &user);
        users.push((user, token));
    }

    let allowed_sets: [&[Role]; 4] = [
        &[Role::SuperAdmin, Role::Moderator],
        &[Role::Company],
        &[Role::Guardian, Role::Caregiver, Role::Patient],
        &[],
    ];

    for allowed in allowed_sets {
        let spy = Spy::default();
        let app = guarded(&state, &spy, &roles_pipeline(allowed));

        for (user, token) in &users {
            let response = send(&app, get_request("/guarded", Some(token))).await;
            if allowed.contains(&user.role) {
                assert_eq!(response.status(), StatusCode::OK, "{} in {allowed:?}", user.role);
            } else {
                assert_eq!(
                    response.status(),
                    StatusCode::FORBIDDEN,
                    "{} not in {allowed:?}",
                    user.role
                );
                let body = body_json(response).await;
                assert_eq!(body["code"], "FORBIDDEN_ROLE");
                assert_eq!(body["error"], "insufficient role");
            }
        }

        assert_eq!(spy.calls(), allowed.len());
    }
}

#[tokio::test]
async fn test_company_denied_staff_only_route() {
    let (state, store) = test_state();
    let company = seed_user(&store, Role::Company).await;
    let spy = Spy::default();
    let app = guarded(
        &state,
        &spy,
        &roles_pipeline(&[Role::SuperAdmin, Role::Moderator]),
    );

    let response = send(&app, get_request("/guarded", Some(&token_for(&state, &company)))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "insufficient role");
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_role_comes_from_account_not_token() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let forged = create_access_token(
        guardian.id,
        Role::SuperAdmin,
        None,
        None,
        &state.jwt_config,
    )
    .unwrap();

    let spy = Spy::default();
    let app = guarded(&state, &spy, &roles_pipeline(&[Role::SuperAdmin]));

    let response = send(&app, get_request("/guarded", Some(&forged))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_deactivated_account_is_rejected() {
    let (state, store) = test_state();
    let user = store
        .insert_user(User::new("gone@carenet.test", Role::Guardian).deactivated())
        .await;

    let spy = Spy::default();
    let app = guarded(&state, &spy, &roles_pipeline(&Role::all()));

    let response = send(&app, get_request("/guarded", Some(&token_for(&state, &user)))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "INVALID_CREDENTIAL");
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_cookie_credential_is_accepted() {
    let (state, store) = test_state();
    let user = seed_user(&store, Role::Guardian).await;
    let spy = Spy::default();
    let app = guarded(&state, &spy, &roles_pipeline(&[Role::Guardian]));

    let request = axum::http::Request::builder()
        .uri("/guarded")
        .header(
            header::COOKIE,
            format!("theme=dark; access_token={}", token_for(&state, &user)),
        )
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(spy.calls(), 1);
}

async fn explode() -> StatusCode {
    panic!("connection string leaked: postgres://secret");
}

#[tokio::test]
async fn test_panic_becomes_generic_500() {
    let (state, _store) = test_state();
    let pipeline = PipelineBuilder::new()
        .with_request_logging()
        .with_error_handler()
        .build();
    let spy = Spy::default();
    let app = Router::new()
        .route("/explode", get(explode.layer(pipeline.layer(&state))))
        .route("/ok", get(spy.handler().layer(pipeline.layer(&state))))
        .with_state(state.clone());

    let response = send(&app, get_request("/explode", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body.to_string().contains("postgres"));

    // The process keeps serving.
    let response = send(&app, get_request("/ok", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(spy.calls(), 1);
}

#[tokio::test]
async fn test_declaration_order_does_not_change_execution_order() {
    let (state, _store) = test_state();

    // Authorization declared before CORS: a preflight must still be answered
    // by CORS without credentials.
    let pipeline = PipelineBuilder::new()
        .with_roles(&[Role::SuperAdmin])
        .with_cors(state.cors_config.clone())
        .with_error_handler()
        .build();
    assert_eq!(
        pipeline.stage_names(),
        vec!["error_handler", "cors", "auth", "roles"]
    );

    let spy = Spy::default();
    let app = Router::new()
        .route(
            "/guarded",
            get(spy.handler().layer(pipeline.layer(&state)))
                .options(carenet::middleware::cors::preflight.layer(pipeline.layer(&state))),
        )
        .with_state(state.clone());

    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/guarded")
        .header(header::ORIGIN, common::ALLOWED_ORIGIN)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        common::ALLOWED_ORIGIN
    );
    assert_eq!(spy.calls(), 0);
}

async fn whoami(user: Option<AuthUser>) -> String {
    match user {
        Some(AuthUser(principal)) => principal.role.to_string(),
        None => "anonymous".to_string(),
    }
}

#[tokio::test]
async fn test_optional_auth_lets_every_caller_through() {
    let (state, store) = test_state();
    let guardian = seed_user(&store, Role::Guardian).await;
    let gone = store
        .insert_user(User::new("left@carenet.test", Role::Moderator).deactivated())
        .await;

    let pipeline = PipelineBuilder::new()
        .with_error_handler()
        .with_optional_auth()
        .build();
    assert_eq!(pipeline.stage_names(), vec!["error_handler", "optional_auth"]);

    let spy = Spy::default();
    let app = Router::new()
        .route("/whoami", get(whoami.layer(pipeline.layer(&state))))
        .route("/guarded", get(spy.handler().layer(pipeline.layer(&state))))
        .with_state(state.clone());

    let cases = [
        (None, "anonymous"),
        (Some(token_for(&state, &guardian)), "GUARDIAN"),
        (Some("not-a-jwt".to_string()), "anonymous"),
        (Some(token_for(&state, &gone)), "anonymous"),
    ];

    for (token, expected) in &cases {
        let response = send(&app, get_request("/whoami", token.as_deref())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, expected.as_bytes());

        let response = send(&app, get_request("/guarded", token.as_deref())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(spy.calls(), cases.len());
}
