use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use carenet_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::payments::model::{Payment, PaymentListResponse};
use crate::modules::payments::service::PaymentService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/payments",
    responses(
        (status = 200, description = "Payments visible to the caller", body = PaymentListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - patients have no payment access")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_payments(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<PaymentListResponse>, AppError> {
    let payments = PaymentService::list_payments(state.store.as_ref(), &principal).await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payments/{payment_id}",
    params(
        ("payment_id" = Uuid, Path, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Payment details", body = Payment),
        (status = 400, description = "Malformed payment ID"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - not the payer, payee or agency"),
        (status = 404, description = "Payment not found")
    ),
    tag = "Payments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    let payment = PaymentService::get_payment(state.store.as_ref(), payment_id).await?;
    Ok(Json(payment))
}
