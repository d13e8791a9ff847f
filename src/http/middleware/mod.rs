//! HTTP middleware.

pub mod access_log;

pub use access_log::{exclude_route, AccessLog, AccessLogLayer, Excluded};
