#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use carenet::state::AppState;
use carenet::store::{Company, MemoryStore, User};
use carenet_auth::create_access_token;
use carenet_cache::MemoryCounterStore;
use carenet_config::WindowLimit;
use carenet_core::Role;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// In-memory state with limits high enough that tests never trip them by
/// accident.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut state = AppState::new(store.clone(), Arc::new(MemoryCounterStore::new()));
    state.rate_limit_config.general = WindowLimit::new(10_000, 60_000);
    state.rate_limit_config.auth = WindowLimit::new(10_000, 60_000);
    state.rate_limit_config.identity = WindowLimit::new(10_000, 60_000);
    (state, store)
}

pub fn token_for(state: &AppState, user: &User) -> String {
    create_access_token(
        user.id,
        user.role,
        user.company_id,
        Some(&user.email),
        &state.jwt_config,
    )
    .unwrap()
}

pub async fn seed_user(store: &MemoryStore, role: Role) -> User {
    let email = format!("{}-{}@carenet.test", role.as_str().to_lowercase(), uuid::Uuid::new_v4());
    store.insert_user(User::new(email, role)).await
}

/// A COMPANY account together with the company it administers.
pub async fn seed_company(store: &MemoryStore) -> (User, Company) {
    let owner = User::new(
        format!("agency-{}@carenet.test", uuid::Uuid::new_v4()),
        Role::Company,
    );
    let company = store.insert_company(Company::new("Acme Care", owner.id)).await;
    let owner = store.insert_user(owner.in_company(company.id)).await;
    (owner, company)
}

pub async fn seed_employee(store: &MemoryStore, company: &Company) -> User {
    let email = format!("caregiver-{}@carenet.test", uuid::Uuid::new_v4());
    store
        .insert_user(User::new(email, Role::Caregiver).in_company(company.id))
        .await
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Counts how often the wrapped handler actually ran.
#[derive(Clone, Default)]
pub struct Spy(Arc<AtomicUsize>);

impl Spy {
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn handler(
        &self,
    ) -> impl Fn() -> std::future::Ready<StatusCode> + Clone + Send + Sync + 'static {
        let counter = self.0.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(StatusCode::OK)
        }
    }
}
