//! # Axum Helpers
//!
//! Shared HTTP plumbing for the directory API.
//!
//! - **[`errors`]**: the JSON error body (`code`, `error`, `message`, `details`) and [`ErrorCode`]
//! - **[`extractors`]**: [`ValidatedJson`], [`ValidatedQuery`] and [`IdPath`]
//! - **[`http`]**: security headers and CORS
//! - **[`server`]**: router assembly, health/readiness, graceful shutdown

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use errors::{
    AppError, ErrorCode, ErrorResponse, error_response, validation_details,
    validation_error_response,
};
pub use extractors::{IdPath, ValidatedJson, ValidatedQuery};
pub use http::{create_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
