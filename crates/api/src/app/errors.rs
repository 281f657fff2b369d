use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use shapes_core::DomainError;
use shapes_infra::StoreError;

/// Anything that can go wrong while a resource handler runs its operation.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Run a handler operation, turning any failure into a `text/plain`
/// response with the given status and `prefix` followed by the error message.
pub async fn perform_service_operation<Fut>(
    operation: Fut,
    status: StatusCode,
    prefix: impl Into<String>,
) -> Response
where
    Fut: Future<Output = Result<Response, ResourceError>>,
{
    match operation.await {
        Ok(response) => response,
        Err(err) => {
            let mut message = prefix.into();
            tracing::error!(error = %err, "{message}");
            message.push_str(&err.to_string());
            (status, message).into_response()
        }
    }
}
