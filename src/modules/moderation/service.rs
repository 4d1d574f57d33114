use carenet_core::{AppError, Role};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::store::{CareStore, Company, User};

pub struct ModerationService;

impl ModerationService {
    #[instrument(skip(store))]
    pub async fn verify_company(
        store: &dyn CareStore,
        company_id: Uuid,
        verified: bool,
    ) -> Result<Company, AppError> {
        let company = store.set_company_verified(company_id, verified).await?;
        info!(company_id = %company.id, verified, "Company verification updated");
        Ok(company)
    }

    #[instrument(skip(store))]
    pub async fn verify_caregiver(
        store: &dyn CareStore,
        user_id: Uuid,
        verified: bool,
    ) -> Result<User, AppError> {
        let user = store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if user.role != Role::Caregiver {
            return Err(AppError::bad_request("User is not a caregiver"));
        }

        let user = store.set_caregiver_verified(user.id, verified).await?;
        info!(user_id = %user.id, verified, "Caregiver verification updated");
        Ok(user)
    }
}
