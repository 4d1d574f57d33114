use axum::{Router, handler::Handler, routing::post};
use carenet_auth::{Action, Resource};

use crate::middleware::cors::preflight;
use crate::middleware::pipeline::PipelineBuilder;
use crate::state::AppState;

use super::controller::{verify_caregiver, verify_company};

/// Preflights go through `public`; every other route builds on `base`.
pub fn init_moderation_router(
    state: &AppState,
    public: &PipelineBuilder,
    base: &PipelineBuilder,
) -> Router<AppState> {
    let companies = base
        .clone()
        .with_resource_auth(Resource::Companies, Action::Verify)
        .build();
    let caregivers = base
        .clone()
        .with_resource_auth(Resource::Caregivers, Action::Verify)
        .build();
    let cors = public.clone().build().layer(state);

    Router::new()
        .route(
            "/companies/{company_id}/verify",
            post(verify_company.layer(companies.layer(state)))
                .options(preflight.layer(cors.clone())),
        )
        .route(
            "/caregivers/{user_id}/verify",
            post(verify_caregiver.layer(caregivers.layer(state))).options(preflight.layer(cors)),
        )
}
