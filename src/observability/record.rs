//! Structured record construction.
//!
//! Turns an [`Event`] into the JSON shape expected by Cloud Logging. The
//! builder is pure apart from reading the clock for records that are not
//! tied to a request.

use std::sync::Arc;
use std::time::Instant;

use axum::http::header::{HeaderName, REFERER, USER_AGENT};
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::config::Settings;
use crate::observability::events::{Event, ResponseSummary, ServerPhase};
use crate::observability::severity::{self, ResidualTags, Severity};
use crate::observability::timestamp::Timestamp;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Operation id used for server-scoped log events.
pub const SERVER_LOG_OPERATION: &str = "log";

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredRecord {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(rename = "logging.googleapis.com/operation")]
    pub operation: Operation,
    pub timestamp: Timestamp,
    #[serde(rename = "serviceContext", skip_serializing_if = "Option::is_none")]
    pub service_context: Option<ServiceContext>,
    #[serde(skip_serializing_if = "ResidualTags::is_empty")]
    pub tags: ResidualTags,
    #[serde(rename = "httpRequest", skip_serializing_if = "Option::is_none")]
    pub http_request: Option<HttpRequest>,
}

/// Correlation block grouping related lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub id: String,
    pub producer: String,
}

/// Error Reporting service block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub request_method: String,
    pub request_url: String,
    pub request_size: u64,
    pub status: u16,
    pub response_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    pub cache_hit: bool,
    pub cache_validated_with_origin_server: bool,
    pub latency: Timestamp,
}

/// Builds records for one server instance.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    settings: Arc<Settings>,
    producer: String,
}

impl RecordBuilder {
    pub fn new(settings: Arc<Settings>, producer: impl Into<String>) -> Self {
        Self {
            settings,
            producer: producer.into(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Build the record for `event`, or `None` when the event is suppressed
    /// (excluded responses).
    pub fn build(&self, event: &Event) -> Option<StructuredRecord> {
        match event {
            Event::ServerLifecycle(phase) => {
                let (id, message) = match phase {
                    ServerPhase::Started => ("start", "server started"),
                    ServerPhase::Stopped => ("stop", "server stopped"),
                };
                Some(self.record(Severity::Info, id, Some(Value::from(message))))
            }
            Event::ProcessSignal(signal) => {
                let message = format!("caught {signal}, shutting down");
                Some(self.record(Severity::Info, signal.name(), Some(Value::from(message))))
            }
            Event::FatalFault { kind, description } => Some(self.record(
                Severity::Critical,
                kind.name(),
                Some(Value::from(description.as_str())),
            )),
            Event::Log {
                tags,
                data,
                request_id,
            } => {
                let (severity, residual) = severity::resolve(tags);
                let id = request_id.as_deref().unwrap_or(SERVER_LOG_OPERATION);
                let mut record = self.record(severity, id, Some(data.clone()));
                record.tags = residual;
                Some(record)
            }
            Event::RequestError {
                request_id,
                description,
            } => Some(self.record(
                Severity::Error,
                request_id,
                Some(Value::from(description.as_str())),
            )),
            Event::Response(summary) => self.response(summary),
        }
    }

    fn record(&self, severity: Severity, operation_id: &str, message: Option<Value>) -> StructuredRecord {
        StructuredRecord {
            severity,
            message,
            operation: Operation {
                id: operation_id.to_string(),
                producer: self.producer.clone(),
            },
            timestamp: Timestamp::now(),
            service_context: severity.is_reportable().then(|| ServiceContext {
                service: self.settings.service_name().map(str::to_owned),
            }),
            tags: ResidualTags::new(),
            http_request: None,
        }
    }

    fn response(&self, summary: &ResponseSummary) -> Option<StructuredRecord> {
        if summary.route_excluded || self.settings.is_excluded(&summary.path) {
            return None;
        }

        let latency = summary
            .responded
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(summary.received);

        let mut record = self.record(Severity::Info, &summary.request_id, None);
        record.timestamp = Timestamp::from_system_time(summary.received_at);
        record.http_request = Some(HttpRequest {
            request_method: summary.method.to_ascii_uppercase(),
            request_url: self.request_url(summary),
            request_size: summary.request_size,
            status: summary.status,
            response_size: summary.response_size,
            user_agent: header_str(&summary.headers, &USER_AGENT).map(str::to_owned),
            remote_ip: remote_ip(summary),
            referer: header_str(&summary.headers, &REFERER).map(str::to_owned),
            cache_hit: false,
            cache_validated_with_origin_server: false,
            latency: Timestamp::from_duration(latency),
        });

        Some(record)
    }

    fn request_url(&self, summary: &ResponseSummary) -> String {
        let protocol = first_forwarded(&summary.headers, X_FORWARDED_PROTO)
            .or_else(|| summary.connection.map(|c| c.protocol))
            .unwrap_or("http");

        let host = summary
            .host
            .clone()
            .or_else(|| summary.connection.and_then(|c| c.host()))
            .unwrap_or_else(|| self.settings.service_name().unwrap_or("localhost").to_string());

        format!("{protocol}://{host}{}", summary.path_and_query)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First entry of a comma-separated forwarding header, trimmed.
fn first_forwarded<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn remote_ip(summary: &ResponseSummary) -> Option<String> {
    first_forwarded(&summary.headers, X_FORWARDED_FOR)
        .map(str::to_owned)
        .or_else(|| summary.connection.map(|c| c.remote.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use axum::http::HeaderValue;

    use crate::config::LoggerConfig;
    use crate::lifecycle::signals::Signal;
    use crate::net::ConnectionInfo;
    use crate::observability::events::FaultKind;

    fn builder_with(config: LoggerConfig) -> RecordBuilder {
        RecordBuilder::new(
            Arc::new(Settings::with_host(&config, Some("pod-7".into()))),
            "pod-7:42:abc",
        )
    }

    fn builder() -> RecordBuilder {
        builder_with(LoggerConfig {
            exclude: vec!["/health".into()],
            ..Default::default()
        })
    }

    fn summary(path: &str) -> ResponseSummary {
        let received = Instant::now();
        ResponseSummary {
            request_id: "req-1".into(),
            method: "get".into(),
            path: path.into(),
            path_and_query: format!("{path}?verbose=1"),
            host: Some("api.example.com".into()),
            headers: HeaderMap::new(),
            connection: Some(ConnectionInfo::http(
                Some("0.0.0.0:8080".parse().unwrap()),
                "10.1.2.3:50000".parse().unwrap(),
            )),
            received_at: UNIX_EPOCH + Duration::from_millis(1_700_000_000_250),
            received,
            responded: Some(received + Duration::from_millis(37)),
            status: 200,
            request_size: 42,
            response_size: 128,
            route_excluded: false,
        }
    }

    fn all_kinds() -> Vec<Event> {
        vec![
            Event::ServerLifecycle(ServerPhase::Started),
            Event::ProcessSignal(Signal::Term),
            Event::FatalFault {
                kind: FaultKind::UncaughtException,
                description: "boom".into(),
            },
            Event::Log {
                tags: vec!["error".into()],
                data: Value::from("db down"),
                request_id: None,
            },
            Event::Log {
                tags: vec!["debug".into()],
                data: Value::from("cache miss"),
                request_id: Some("req-1".into()),
            },
            Event::RequestError {
                request_id: "req-1".into(),
                description: "handler failed".into(),
            },
            Event::Response(Box::new(summary("/users/1"))),
        ]
    }

    #[test]
    fn service_context_iff_error_or_critical() {
        let builder = builder();
        for event in all_kinds() {
            let record = builder.build(&event).expect("record");
            assert_eq!(
                record.service_context.is_some(),
                record.severity.is_reportable(),
                "{event:?}"
            );
        }
    }

    #[test]
    fn lifecycle_records() {
        let builder = builder();

        let started = builder.build(&Event::ServerLifecycle(ServerPhase::Started)).unwrap();
        assert_eq!(started.severity, Severity::Info);
        assert_eq!(started.message, Some(Value::from("server started")));
        assert_eq!(started.operation.id, "start");
        assert_eq!(started.operation.producer, "pod-7:42:abc");

        let stopped = builder.build(&Event::ServerLifecycle(ServerPhase::Stopped)).unwrap();
        assert_eq!(stopped.message, Some(Value::from("server stopped")));
        assert_eq!(stopped.operation.id, "stop");

        let sigint = builder.build(&Event::ProcessSignal(Signal::Int)).unwrap();
        assert_eq!(sigint.message, Some(Value::from("caught SIGINT, shutting down")));
        assert_eq!(sigint.operation.id, "SIGINT");
    }

    #[test]
    fn fatal_fault_record() {
        let record = builder()
            .build(&Event::FatalFault {
                kind: FaultKind::UnhandledRejection,
                description: "task failed\ncaused by: timeout".into(),
            })
            .unwrap();

        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.operation.id, "unhandledRejection");
        assert_eq!(record.message, Some(Value::from("task failed\ncaused by: timeout")));
        assert_eq!(record.service_context.unwrap().service.as_deref(), Some("pod-7"));
    }

    #[test]
    fn log_records_use_tags_and_scope() {
        let builder = builder();

        let record = builder
            .build(&Event::Log {
                tags: vec!["error".into(), "db".into(), "warning".into()],
                data: serde_json::json!({"table": "users"}),
                request_id: None,
            })
            .unwrap();
        assert_eq!(record.severity, Severity::Warning);
        assert_eq!(record.operation.id, SERVER_LOG_OPERATION);
        assert_eq!(record.message.as_ref().unwrap()["table"], "users");
        assert_eq!(record.tags.get("db"), Some(&true));
        assert!(record.service_context.is_none());

        let record = builder
            .build(&Event::Log {
                tags: vec!["critical".into()],
                data: Value::from("disk full"),
                request_id: Some("req-9".into()),
            })
            .unwrap();
        assert_eq!(record.operation.id, "req-9");
        assert!(record.service_context.is_some());
    }

    #[test]
    fn request_error_record() {
        let record = builder()
            .build(&Event::RequestError {
                request_id: "req-3".into(),
                description: "handler failed".into(),
            })
            .unwrap();
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.operation.id, "req-3");
        assert!(record.service_context.is_some());
    }

    #[test]
    fn response_record_fields() {
        let record = builder()
            .build(&Event::Response(Box::new(summary("/users/1"))))
            .unwrap();

        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.operation.id, "req-1");
        assert_eq!(record.timestamp, Timestamp { seconds: 1_700_000_000, nanos: 250_000_000 });
        assert!(record.message.is_none());

        let http = record.http_request.unwrap();
        assert_eq!(http.request_method, "GET");
        assert_eq!(http.request_url, "http://api.example.com/users/1?verbose=1");
        assert_eq!(http.request_size, 42);
        assert_eq!(http.response_size, 128);
        assert_eq!(http.status, 200);
        assert_eq!(http.remote_ip.as_deref(), Some("10.1.2.3"));
        assert_eq!(http.user_agent, None);
        assert_eq!(http.referer, None);
        assert_eq!(http.latency, Timestamp { seconds: 0, nanos: 37_000_000 });
    }

    #[test]
    fn excluded_responses_build_nothing() {
        let builder = builder();
        assert!(builder.build(&Event::Response(Box::new(summary("/health")))).is_none());

        let mut route_excluded = summary("/users/1");
        route_excluded.route_excluded = true;
        assert!(builder.build(&Event::Response(Box::new(route_excluded))).is_none());
    }

    #[test]
    fn forwarded_headers_take_precedence() {
        let mut summary = summary("/users/1");
        summary.headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        summary
            .headers
            .insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        summary.headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.4.0"));
        summary.headers.insert(REFERER, HeaderValue::from_static("https://example.com/"));

        let http = builder()
            .build(&Event::Response(Box::new(summary)))
            .unwrap()
            .http_request
            .unwrap();

        assert_eq!(http.request_url, "https://api.example.com/users/1?verbose=1");
        assert_eq!(http.remote_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(http.user_agent.as_deref(), Some("curl/8.4.0"));
        assert_eq!(http.referer.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn unspecified_connection_host_uses_service_name() {
        let mut summary = summary("/users/1");
        summary.host = None;

        let http = builder()
            .build(&Event::Response(Box::new(summary.clone())))
            .unwrap()
            .http_request
            .unwrap();
        assert_eq!(http.request_url, "http://pod-7/users/1?verbose=1");

        summary.connection = Some(ConnectionInfo::http(
            Some("127.0.0.1:8080".parse().unwrap()),
            "127.0.0.1:50000".parse().unwrap(),
        ));
        let http = builder()
            .build(&Event::Response(Box::new(summary)))
            .unwrap()
            .http_request
            .unwrap();
        assert_eq!(http.request_url, "http://127.0.0.1:8080/users/1?verbose=1");
    }

    #[test]
    fn missing_responded_mark_measures_until_now() {
        let mut summary = summary("/users/1");
        summary.received = Instant::now();
        summary.responded = None;
        summary.received_at = SystemTime::now();

        let http = builder()
            .build(&Event::Response(Box::new(summary)))
            .unwrap()
            .http_request
            .unwrap();
        assert_eq!(http.latency.seconds, 0);
    }

    #[test]
    fn wire_field_names() {
        let record = builder()
            .build(&Event::Response(Box::new(summary("/users/1"))))
            .unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["severity"], "INFO");
        assert_eq!(json["logging.googleapis.com/operation"]["id"], "req-1");
        assert_eq!(json["logging.googleapis.com/operation"]["producer"], "pod-7:42:abc");
        assert_eq!(json["timestamp"]["seconds"], 1_700_000_000);
        assert_eq!(json["timestamp"]["nanos"], 250_000_000);
        assert_eq!(json["httpRequest"]["requestMethod"], "GET");
        assert_eq!(json["httpRequest"]["cacheValidatedWithOriginServer"], false);
        assert_eq!(json["httpRequest"]["latency"]["nanos"], 37_000_000);
        assert!(json["httpRequest"].get("referer").is_none());
        assert!(json.get("serviceContext").is_none());
        assert!(json.get("tags").is_none());
        assert!(json.get("message").is_none());
    }
}
