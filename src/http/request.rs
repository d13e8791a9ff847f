//! Per-request logging context.
//!
//! # Responsibilities
//! - Resolve the request ID (tower-http `RequestId`, `x-request-id`, or a new UUID)
//! - Record the received time and own the request's byte counters
//! - Let handlers emit request-scoped log events
//!
//! # Design Decisions
//! - The context lives in request extensions and is dropped with the request;
//!   nothing is shared across requests

use std::time::{Instant, SystemTime};

use axum::http::Request;
use serde::Serialize;
use tower_http::request_id::RequestId;
use uuid::Uuid;

use crate::http::body::RequestByteCounters;
use crate::observability::events::{to_log_value, Event};
use crate::observability::Logger;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request extension created when a request enters the access log layer.
///
/// Handlers extract it with `Extension<RequestContext>`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: String,
    received_at: SystemTime,
    received: Instant,
    counters: RequestByteCounters,
    logger: Logger,
}

impl RequestContext {
    pub fn begin<B>(request: &Request<B>, logger: Logger) -> Self {
        Self {
            id: resolve_request_id(request),
            received_at: SystemTime::now(),
            received: Instant::now(),
            counters: RequestByteCounters::default(),
            logger,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wall-clock receive time, used as the response record timestamp.
    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    /// Monotonic receive mark, used for latency.
    pub fn received(&self) -> Instant {
        self.received
    }

    pub fn counters(&self) -> &RequestByteCounters {
        &self.counters
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Request-scoped tagged log event.
    pub fn log<I, T, D>(&self, tags: I, data: &D)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        D: Serialize + ?Sized,
    {
        self.logger.dispatch(Event::Log {
            tags: tags.into_iter().map(Into::into).collect(),
            data: to_log_value(data),
            request_id: Some(self.id.clone()),
        });
    }
}

fn resolve_request_id<B>(request: &Request<B>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::header_value)
        .or_else(|| request.headers().get(X_REQUEST_ID))
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
