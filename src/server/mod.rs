//! HTTP boundary
//!
//! Exposes the registry and distribution layer over HTTP with axum.

pub mod config;
pub mod error;
pub mod listener;
pub mod routes;

pub use config::{QualityProfile, ServerConfig};
pub use error::ApiError;
pub use listener::CamServer;
pub use routes::{router, AppState};
