//! Handler error replies.
//!
//! [`ApiError`] short-circuits a request with a JSON error payload. The
//! response carries two extensions the access log layer looks for:
//! [`ErrorReply`] (the payload, so its size is known without counting the
//! body) and, for server errors, [`RequestFault`] (the error description for
//! the request-error record).

use std::error::Error;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::observability::events::describe_error;

type BoxError = Box<dyn Error + Send + Sync>;

/// Message returned to clients for server errors; details stay in the logs.
const INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// JSON body of an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

impl ErrorPayload {
    /// Length of the serialized payload in bytes.
    pub fn encoded_len(&self) -> u64 {
        serde_json::to_vec(self).map(|v| v.len() as u64).unwrap_or(0)
    }
}

/// Response extension marking a structured error short-circuit.
#[derive(Debug, Clone)]
pub struct ErrorReply(pub ErrorPayload);

/// Response extension reporting a request-level error.
#[derive(Debug, Clone)]
pub struct RequestFault {
    pub description: String,
}

impl RequestFault {
    pub fn from_error(err: &dyn Error) -> Self {
        Self {
            description: describe_error(err),
        }
    }
}

/// Error type for handlers.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Server error wrapping the underlying cause.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> ErrorPayload {
        let message = if self.status.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.message.clone()
        };

        ErrorPayload {
            status_code: self.status.as_u16(),
            error: self.status.canonical_reason().unwrap_or("Unknown").to_string(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = self.payload();
        let mut response = (self.status, Json(payload.clone())).into_response();

        if self.status.is_server_error() {
            response.extensions_mut().insert(RequestFault::from_error(&self));
        }
        response.extensions_mut().insert(ErrorReply(payload));
        response
    }
}
