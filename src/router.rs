use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    routing::get,
};
use carenet_core::AppError;
use carenet_observability::metrics_middleware;
use serde_json::{Value, json};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::middleware::pipeline::PipelineBuilder;
use crate::modules::auth::init_auth_router;
use crate::modules::disputes::init_disputes_router;
use crate::modules::jobs::init_jobs_router;
use crate::modules::moderation::init_moderation_router;
use crate::modules::payments::init_payments_router;
use crate::state::AppState;

/// Stages shared by every API route. Routes open to anonymous callers use
/// the public base; everything else also throttles per principal.
pub fn base_pipelines(state: &AppState) -> (PipelineBuilder, PipelineBuilder) {
    let public = PipelineBuilder::new()
        .with_request_logging()
        .with_error_handler()
        .with_cors(state.cors_config.clone())
        .with_rate_limit("general", state.rate_limit_config.general);
    let authenticated = public
        .clone()
        .with_identity_rate_limit("identity", state.rate_limit_config.identity);
    (public, authenticated)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are reachable"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.health_check().await?;
    Ok(Json(json!({
        "status": "ok",
        "store": state.store.backend_name(),
    })))
}

pub fn init_router(state: AppState) -> Router {
    let (public, base) = base_pipelines(&state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router(&state, &public, &base))
                .nest("/jobs", init_jobs_router(&state, &public, &base))
                .nest("/payments", init_payments_router(&state, &public, &base))
                .nest("/disputes", init_disputes_router(&state, &public, &base))
                .nest("/moderation", init_moderation_router(&state, &public, &base)),
        )
        .route_layer(middleware::from_fn(metrics_middleware))
        .fallback(not_found)
        .with_state(state)
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found", "code": "NOT_FOUND" })),
    )
}
