//! Axum HTTP API server.
//!
//! This crate provides:
//! - The upload-to-publish pipeline orchestrator
//! - Firebase ID token verification
//! - Request routing, body limits and security middleware
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::UploadService;
pub use state::AppState;
