//! Structured request and lifecycle logging for axum servers.
//!
//! Every record is one JSON line on stdout in the Google Cloud Logging shape.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{AppConfig, Settings};
pub use http::{ApiError, HttpServer, RequestContext};
pub use lifecycle::{Lifecycle, Shutdown};
pub use observability::{Logger, Sink};
