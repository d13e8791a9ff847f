//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, request ID + trace layers, lifecycle hooks)
//!     → middleware/access_log.rs (RequestContext, byte counters)
//!     → application router (handlers may return error.rs ApiError)
//!     → middleware/access_log.rs (request-error record, response record)
//!     → Send to client
//! ```

pub mod body;
pub mod error;
pub mod middleware;
pub mod request;
pub mod server;

pub use body::{ByteCounter, CountingBody, RequestByteCounters};
pub use error::{ApiError, ErrorPayload, ErrorReply, RequestFault};
pub use middleware::{exclude_route, AccessLogLayer, Excluded};
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
