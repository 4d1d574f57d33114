//! Panic boundary for the error handler stage.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::response::{IntoResponse, Response};
use carenet_core::AppError;
use carenet_observability::track_panic;
use futures::FutureExt;

/// Awaits `inner`; a panic becomes the generic 500 body. The panic message
/// goes to the log only.
pub async fn catch_panic<F>(inner: F) -> Response
where
    F: Future<Output = Response>,
{
    match AssertUnwindSafe(inner).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            track_panic();
            AppError::internal_error(format!("handler panicked: {}", panic_message(&*panic)))
                .into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
