//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! server hooks / signals / faults / handlers / access log middleware
//!     → events.rs (Event)
//!     → logger.rs (single dispatch point)
//!     → record.rs (StructuredRecord, via severity.rs + timestamp.rs)
//!     → sink.rs (one JSON line on stdout)
//!
//! Diagnostics:
//!     → logging.rs (tracing to stderr)
//!     → metrics.rs (record counters, optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Records and diagnostics never share a stream
//! - Record construction is pure; only the sink performs I/O

pub mod events;
pub mod logger;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod severity;
pub mod sink;
pub mod timestamp;

pub use events::{Event, FaultKind, ResponseSummary, ServerPhase};
pub use logger::Logger;
pub use record::{RecordBuilder, StructuredRecord};
pub use severity::Severity;
pub use sink::{SharedBuffer, Sink};
pub use timestamp::Timestamp;
