use axum::{
    Router,
    handler::Handler,
    routing::{get, post},
};

use crate::middleware::cors::preflight;
use crate::middleware::pipeline::PipelineBuilder;
use crate::state::AppState;

use super::controller::{me, refresh_token};

/// `public` carries no authentication; `base` is the authenticated base.
pub fn init_auth_router(
    state: &AppState,
    public: &PipelineBuilder,
    base: &PipelineBuilder,
) -> Router<AppState> {
    let me_pipeline = base.clone().with_auth().build();
    let refresh = public
        .clone()
        .with_rate_limit("auth", state.rate_limit_config.auth)
        .build();
    let cors = public.clone().build().layer(state);

    Router::new()
        .route(
            "/me",
            get(me.layer(me_pipeline.layer(state))).options(preflight.layer(cors.clone())),
        )
        .route(
            "/refresh",
            post(refresh_token.layer(refresh.layer(state))).options(preflight.layer(cors)),
        )
}
