use axum::{routing::get, Router};

use crate::app::services::AppServices;

pub mod system;

/// Entity collections plus the health check.
pub fn router(services: &AppServices) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(services.router())
}
