//! Authorization stages. Each reads the principal attached by the
//! authentication stage and consults the permission resolver.

use axum::{
    RequestExt,
    extract::{RawPathParams, Request},
    response::{IntoResponse, Response},
};
use carenet_auth::credentials::MISSING_CREDENTIAL_MESSAGE;
use carenet_auth::{
    Action, AuthzError, Principal, Resource, authorize, authorize_any_scope,
    authorize_own_resource, authorize_resource,
};
use carenet_core::{AppError, Role};
use carenet_observability::track_auth_denied;
use tracing::{error, warn};
use uuid::Uuid;

use crate::middleware::pipeline::Flow;
use crate::state::AppState;

fn principal(request: &Request) -> Result<&Principal, Response> {
    request
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::unauthenticated(MISSING_CREDENTIAL_MESSAGE).into_response())
}

fn deny(principal: &Principal, err: AuthzError, check: &str) -> Flow {
    warn!(
        user_id = %principal.id,
        role = principal.role.as_str(),
        reason = err.reason(),
        check,
        "Access denied"
    );
    track_auth_denied(err.reason(), principal.role.as_str());
    Flow::Respond(AppError::from(err).into_response())
}

fn decide(principal: &Principal, result: Result<(), AuthzError>, check: &str) -> Flow {
    match result {
        Ok(()) => Flow::next(),
        Err(err) => deny(principal, err, check),
    }
}

pub fn roles(request: &Request, allowed: &[Role]) -> Flow {
    match principal(request) {
        Ok(principal) => decide(principal, authorize(principal, allowed), "roles"),
        Err(response) => Flow::Respond(response),
    }
}

pub fn resource(request: &Request, resource: Resource, action: Action) -> Flow {
    match principal(request) {
        Ok(principal) => decide(
            principal,
            authorize_resource(principal, resource, action),
            "resource",
        ),
        Err(response) => Flow::Respond(response),
    }
}

/// Singular name used in "not found" messages.
pub fn record_label(resource: Resource) -> &'static str {
    match resource {
        Resource::Users => "User",
        Resource::Companies => "Company",
        Resource::Caregivers => "Caregiver",
        Resource::Patients => "Patient",
        Resource::Jobs => "Job",
        Resource::Payments => "Payment",
        Resource::CareLogs => "Care log",
        Resource::Feedback => "Feedback",
        Resource::Disputes => "Dispute",
        _ => "Record",
    }
}

/// Record-level check on the record named by path parameter `param`.
///
/// Ineligible roles are refused before the record is looked up, so they
/// cannot probe which ids exist.
pub async fn own_resource(
    state: &AppState,
    request: &mut Request,
    resource: Resource,
    action: Action,
    param: &str,
) -> Flow {
    let principal = match principal(request) {
        Ok(principal) => principal.clone(),
        Err(response) => return Flow::Respond(response),
    };

    if let Err(err) = authorize_any_scope(&principal, resource, action) {
        return deny(&principal, err, "own_resource");
    }

    let raw = match request.extract_parts::<RawPathParams>().await {
        Ok(params) => params
            .iter()
            .find(|(name, _)| *name == param)
            .map(|(_, value)| value.to_owned()),
        Err(rejection) => {
            error!(error = %rejection, "Path parameters unavailable");
            None
        }
    };
    let Some(raw) = raw else {
        return Flow::Respond(
            AppError::internal_error(format!("route has no path parameter `{param}`"))
                .into_response(),
        );
    };

    let Ok(id) = Uuid::parse_str(&raw) else {
        return Flow::Respond(
            AppError::bad_request(format!("Invalid {param}: expected a UUID")).into_response(),
        );
    };

    let ownership = match state.store.resource_ownership(resource, id).await {
        Ok(Some(ownership)) => ownership,
        Ok(None) => {
            return Flow::Respond(
                AppError::not_found(format!("{} not found", record_label(resource)))
                    .into_response(),
            );
        }
        Err(err) => return Flow::Respond(AppError::from(err).into_response()),
    };

    match authorize_own_resource(&principal, resource, action, &ownership) {
        Ok(()) => {
            request.extensions_mut().insert(ownership);
            Flow::next()
        }
        Err(err) => deny(&principal, err, "own_resource"),
    }
}
