//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and one entity service per collection
//! - `resource.rs`: the generic CRUD handlers every collection shares
//! - `routes/`: router assembly and system endpoints
//! - `errors.rs`: the uniform error adapter

use axum::Router;

pub mod errors;
pub mod resource;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    routes::router(&services)
}
