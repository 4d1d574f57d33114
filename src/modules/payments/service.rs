use carenet_auth::Principal;
use carenet_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::payments::model::{Payment, PaymentListResponse};
use crate::store::CareStore;
use crate::utils::auth_helpers::listing_scope;

pub struct PaymentService;

impl PaymentService {
    /// Payers see what they paid, payees what they received, agencies their
    /// tenant's payments.
    #[instrument(skip(store))]
    pub async fn list_payments(
        store: &dyn CareStore,
        principal: &Principal,
    ) -> Result<PaymentListResponse, AppError> {
        let scope = listing_scope(principal)?;
        let data = store.list_payments(scope).await?;
        let total = data.len();
        Ok(PaymentListResponse { data, total })
    }

    #[instrument(skip(store))]
    pub async fn get_payment(store: &dyn CareStore, payment_id: Uuid) -> Result<Payment, AppError> {
        Ok(store.get_payment(payment_id).await?)
    }
}
