use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use carenet_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON body that is deserialized and then validated.
///
/// Malformed bodies are 400; bodies that parse but fail validation are 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::bad_request(format!("{field} is required"));
                }

                if error_msg.contains("invalid type") || error_msg.contains("unknown variant") {
                    return AppError::bad_request("Invalid field type in request");
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(
                        "Missing 'Content-Type: application/json' header",
                    );
                }

                AppError::bad_request("Invalid request body")
            })?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow::anyhow!(format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}
