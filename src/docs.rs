use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use carenet_auth::Principal;
use carenet_core::{ErrorCode, ErrorResponse, Role};

use crate::modules::auth::model::{MeResponse, RefreshTokenRequest, TokenResponse};
use crate::modules::disputes::model::{
    CreateDisputeDto, Dispute, DisputeListResponse, DisputeOutcome, DisputeStatus,
    ResolveDisputeDto,
};
use crate::modules::jobs::model::{AssignJobDto, CreateJobDto, Job, JobListResponse, JobStatus};
use crate::modules::moderation::model::VerifyDto;
use crate::modules::payments::model::{Payment, PaymentListResponse, PaymentStatus};
use crate::store::{Company, User};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::modules::auth::controller::me,
        crate::modules::auth::controller::refresh_token,
        crate::modules::jobs::controller::list_jobs,
        crate::modules::jobs::controller::create_job,
        crate::modules::jobs::controller::get_job,
        crate::modules::jobs::controller::assign_job,
        crate::modules::payments::controller::list_payments,
        crate::modules::payments::controller::get_payment,
        crate::modules::disputes::controller::create_dispute,
        crate::modules::disputes::controller::list_disputes,
        crate::modules::disputes::controller::resolve_dispute,
        crate::modules::moderation::controller::verify_company,
        crate::modules::moderation::controller::verify_caregiver,
    ),
    components(
        schemas(
            ErrorResponse,
            ErrorCode,
            Role,
            Principal,
            MeResponse,
            RefreshTokenRequest,
            TokenResponse,
            User,
            Company,
            Job,
            JobStatus,
            JobListResponse,
            CreateJobDto,
            AssignJobDto,
            Payment,
            PaymentStatus,
            PaymentListResponse,
            Dispute,
            DisputeStatus,
            DisputeOutcome,
            DisputeListResponse,
            CreateDisputeDto,
            ResolveDisputeDto,
            VerifyDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Authentication", description = "Caller identity and token renewal"),
        (name = "Jobs", description = "Care jobs posted by guardians and agencies"),
        (name = "Payments", description = "Payments between guardians and caregivers"),
        (name = "Disputes", description = "Dispute filing and resolution"),
        (name = "Moderation", description = "Company and caregiver verification")
    ),
    info(
        title = "CareNet API",
        version = "0.1.0",
        description = "Caregiving marketplace API with role, ownership and tenant-scoped access control.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
