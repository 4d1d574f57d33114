use axum::{
    Router,
    handler::Handler,
    routing::{get, post},
};
use carenet_auth::{Action, Resource};
use carenet_core::Role;

use crate::middleware::cors::preflight;
use crate::middleware::pipeline::PipelineBuilder;
use crate::state::AppState;

use super::controller::{create_dispute, list_disputes, resolve_dispute};

/// Preflights go through `public`; every other route builds on `base`.
pub fn init_disputes_router(
    state: &AppState,
    public: &PipelineBuilder,
    base: &PipelineBuilder,
) -> Router<AppState> {
    let file = base
        .clone()
        .with_resource_auth(Resource::Disputes, Action::Write)
        .build();
    let read = base
        .clone()
        .with_resource_auth(Resource::Disputes, Action::Read)
        .build();
    let resolve = base
        .clone()
        .with_roles(&[Role::SuperAdmin, Role::Moderator])
        .build();
    let cors = public.clone().build().layer(state);

    Router::new()
        .route(
            "/",
            post(create_dispute.layer(file.layer(state)))
                .get(list_disputes.layer(read.layer(state)))
                .options(preflight.layer(cors.clone())),
        )
        .route(
            "/{dispute_id}/resolve",
            post(resolve_dispute.layer(resolve.layer(state))).options(preflight.layer(cors)),
        )
}
