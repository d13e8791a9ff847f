//! Event dispatch.
//!
//! The [`Logger`] is the single entry point for every event source: it
//! builds the record for the event and hands it to the sink.

use std::process;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::Settings;
use crate::observability::events::{to_log_value, Event};
use crate::observability::metrics;
use crate::observability::record::RecordBuilder;
use crate::observability::sink::Sink;

/// Cheaply cloneable handle shared by the middleware, lifecycle and handlers.
#[derive(Debug, Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    builder: RecordBuilder,
    sink: Sink,
}

impl Logger {
    /// Logger with a generated producer id for this process.
    pub fn new(settings: Arc<Settings>, sink: Sink) -> Self {
        let producer = instance_id(settings.service_name().unwrap_or("localhost"));
        Self::with_producer(settings, producer, sink)
    }

    pub fn with_producer(settings: Arc<Settings>, producer: impl Into<String>, sink: Sink) -> Self {
        Self {
            inner: Arc::new(Inner {
                builder: RecordBuilder::new(settings, producer),
                sink,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.inner.builder.settings()
    }

    pub fn producer(&self) -> &str {
        self.inner.builder.producer()
    }

    /// Build and emit the record for `event`. Does nothing when the settings
    /// disable logging.
    pub fn dispatch(&self, event: Event) {
        if self.settings().disabled() {
            metrics::record_suppressed("disabled");
            return;
        }

        match self.inner.builder.build(&event) {
            Some(record) => self.inner.sink.emit(&record),
            None => metrics::record_suppressed("excluded"),
        }
    }

    /// Server-scoped tagged log event.
    pub fn log<I, T, D>(&self, tags: I, data: &D)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        D: Serialize + ?Sized,
    {
        self.dispatch(Event::Log {
            tags: tags.into_iter().map(Into::into).collect(),
            data: to_log_value(data),
            request_id: None,
        });
    }
}

/// `host:pid:started` identifier, started being epoch millis in base 36.
fn instance_id(host: &str) -> String {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{host}:{}:{}", process::id(), base36(started))
}

fn base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
