//! Millisecond epoch values split into the `{seconds, nanos}` pair the
//! ingestion schema expects.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A point in time (or a duration) as whole seconds plus nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i64,
}

impl Timestamp {
    /// Split a millisecond value. Sub-millisecond precision is rounded away
    /// before splitting, so `nanos` stays below one second.
    pub fn from_millis(ms: f64) -> Self {
        let total = ms.round() as i64;
        Self {
            seconds: total.div_euclid(1000),
            nanos: total.rem_euclid(1000) * 1_000_000,
        }
    }

    pub fn from_system_time(at: SystemTime) -> Self {
        let since_epoch = at.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::from_millis(since_epoch.as_millis() as f64)
    }

    /// Encode an elapsed duration (used for `httpRequest.latency`).
    pub fn from_duration(elapsed: Duration) -> Self {
        Self::from_millis(elapsed.as_millis() as f64)
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}
