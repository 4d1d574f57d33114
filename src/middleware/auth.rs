//! Request context extraction.
//!
//! The credential is read from the `Authorization` header or the auth
//! cookie, verified, and resolved against the user directory. Role and
//! company always come from the stored account, so a demoted or deactivated
//! user loses access on the next request even while their token is valid.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    response::IntoResponse,
};
use carenet_auth::credentials::INVALID_CREDENTIAL_MESSAGE;
use carenet_auth::{CredentialError, Principal, extract_credential, verify_token};
use carenet_core::AppError;
use carenet_observability::track_authentication_failure;
use tracing::{debug, warn};

use crate::middleware::pipeline::Flow;
use crate::state::AppState;

fn failure_reason(err: &CredentialError) -> &'static str {
    match err {
        CredentialError::Missing => "missing",
        CredentialError::Malformed => "malformed",
        CredentialError::Invalid => "invalid",
    }
}

/// Resolves the caller from request headers. Read-only.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, AppError> {
    let token = extract_credential(headers, &state.jwt_config.cookie_name).map_err(|err| {
        track_authentication_failure(failure_reason(&err));
        AppError::from(err)
    })?;

    let claims = verify_token(&token, &state.jwt_config).map_err(|err| {
        debug!(error = %err, "Token verification failed");
        track_authentication_failure(failure_reason(&err));
        AppError::from(err)
    })?;

    let user_id = claims.user_id()?;

    let user = state.store.find_user(user_id).await?;
    let Some(user) = user.filter(|user| user.is_active) else {
        warn!(user_id = %user_id, "Token names an unknown or inactive user");
        track_authentication_failure("unknown_user");
        return Err(AppError::unauthorized(INVALID_CREDENTIAL_MESSAGE));
    };

    let mut principal = Principal::new(user.id, user.role).with_email(user.email);
    principal.company_id = user.company_id;
    Ok(principal)
}

/// Authentication stage: attaches the [`Principal`] to the request.
pub async fn authenticate_request(state: &AppState, request: &mut Request) -> Flow {
    match authenticate(state, request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Flow::next()
        }
        Err(err) => Flow::Respond(err.into_response()),
    }
}

/// Optional authentication stage: attaches the [`Principal`] when the
/// request carries a valid credential and lets every request through.
pub async fn authenticate_optional(state: &AppState, request: &mut Request) -> Flow {
    let credential = extract_credential(request.headers(), &state.jwt_config.cookie_name);
    if matches!(credential, Err(CredentialError::Missing)) {
        return Flow::next();
    }

    match authenticate(state, request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
        }
        Err(err) if err.status.is_server_error() => {
            warn!(error = %err.error, "Optional authentication failed, continuing anonymously");
        }
        Err(err) => {
            debug!(error = %err.error, "Ignoring rejected credential on optional route");
        }
    }
    Flow::next()
}

/// The authenticated caller.
///
/// Reads the principal attached by the pipeline, or authenticates on the
/// spot for handlers mounted without one.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthUser(principal.clone()));
        }

        let principal = authenticate(state, &parts.headers).await?;
        parts.extensions.insert(principal.clone());
        Ok(AuthUser(principal))
    }
}

/// `Option<AuthUser>`: the principal attached by an earlier stage, if any.
/// Never authenticates on its own, so anonymous requests are not rejected.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned().map(AuthUser))
    }
}
