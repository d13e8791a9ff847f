//! Events that produce structured records.
//!
//! Every source (server hooks, signals, faults, handlers, the access log
//! middleware) reports through one [`Event`] type; the logger dispatches on
//! the variant.

use std::error::Error;
use std::fmt::Write as _;
use std::time::{Instant, SystemTime};

use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::lifecycle::signals::Signal;
use crate::net::ConnectionInfo;

/// Placeholder written in place of data that could not be serialized.
pub const UNSERIALIZABLE: &str = "[Unserializable]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Started,
    Stopped,
}

/// Origin of a fatal fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A panic nobody caught.
    UncaughtException,
    /// A supervised task finished with an error nobody handled.
    UnhandledRejection,
}

impl FaultKind {
    pub const fn name(&self) -> &'static str {
        match self {
            FaultKind::UncaughtException => "uncaughtException",
            FaultKind::UnhandledRejection => "unhandledRejection",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    ServerLifecycle(ServerPhase),
    ProcessSignal(Signal),
    FatalFault {
        kind: FaultKind,
        description: String,
    },
    /// Tagged application log; `request_id` is `None` for server-scoped logs.
    Log {
        tags: Vec<String>,
        data: Value,
        request_id: Option<String>,
    },
    RequestError {
        request_id: String,
        description: String,
    },
    Response(Box<ResponseSummary>),
}

/// Everything known about a request once its response has been sent.
#[derive(Debug, Clone)]
pub struct ResponseSummary {
    pub request_id: String,
    pub method: String,
    pub path: String,
    /// Path and query exactly as received.
    pub path_and_query: String,
    /// Host from the `Host` header or the request URI authority.
    pub host: Option<String>,
    pub headers: HeaderMap,
    pub connection: Option<ConnectionInfo>,
    pub received_at: SystemTime,
    pub received: Instant,
    pub responded: Option<Instant>,
    pub status: u16,
    pub request_size: u64,
    pub response_size: u64,
    /// The route opted out of access logging.
    pub route_excluded: bool,
}

/// Render an error with its full source chain.
pub fn describe_error(err: &dyn Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(description, "\ncaused by: {cause}");
        source = cause.source();
    }
    description
}

/// Convert arbitrary data into a JSON value, never failing.
pub fn to_log_value<T: Serialize + ?Sized>(data: &T) -> Value {
    serde_json::to_value(data).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Log data is not serializable");
        Value::String(UNSERIALIZABLE.to_string())
    })
}
