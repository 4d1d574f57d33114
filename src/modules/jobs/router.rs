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

use super::controller::{assign_job, create_job, get_job, list_jobs};

/// Preflights go through `public`; every other route builds on `base`.
pub fn init_jobs_router(
    state: &AppState,
    public: &PipelineBuilder,
    base: &PipelineBuilder,
) -> Router<AppState> {
    let read = base
        .clone()
        .with_resource_auth(Resource::Jobs, Action::Read)
        .build();
    let create = base
        .clone()
        .with_roles(&[Role::Guardian, Role::Company, Role::SuperAdmin])
        .build();
    let read_one = base
        .clone()
        .with_own_resource_auth(Resource::Jobs, Action::Read, "job_id")
        .build();
    let assign = base
        .clone()
        .with_resource_auth(Resource::Jobs, Action::Assign)
        .build();
    let cors = public.clone().build().layer(state);

    Router::new()
        .route(
            "/",
            get(list_jobs.layer(read.layer(state)))
                .post(create_job.layer(create.layer(state)))
                .options(preflight.layer(cors.clone())),
        )
        .route(
            "/{job_id}",
            get(get_job.layer(read_one.layer(state))).options(preflight.layer(cors.clone())),
        )
        .route(
            "/{job_id}/assign",
            post(assign_job.layer(assign.layer(state))).options(preflight.layer(cors)),
        )
}
