use axum::{Router, handler::Handler, routing::get};
use carenet_auth::{Action, Resource};
use carenet_core::Role;

use crate::middleware::cors::preflight;
use crate::middleware::pipeline::PipelineBuilder;
use crate::state::AppState;

use super::controller::{get_payment, list_payments};

/// Preflights go through `public`; every other route builds on `base`.
pub fn init_payments_router(
    state: &AppState,
    public: &PipelineBuilder,
    base: &PipelineBuilder,
) -> Router<AppState> {
    let list = base
        .clone()
        .with_roles(&[
            Role::SuperAdmin,
            Role::Moderator,
            Role::Company,
            Role::Guardian,
            Role::Caregiver,
        ])
        .build();
    let read_one = base
        .clone()
        .with_own_resource_auth(Resource::Payments, Action::Read, "payment_id")
        .build();
    let cors = public.clone().build().layer(state);

    Router::new()
        .route(
            "/",
            get(list_payments.layer(list.layer(state))).options(preflight.layer(cors.clone())),
        )
        .route(
            "/{payment_id}",
            get(get_payment.layer(read_one.layer(state))).options(preflight.layer(cors)),
        )
}
