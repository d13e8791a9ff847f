//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde_json::Value;
use stacklog::config::{LoggerConfig, Settings};
use stacklog::http::{HttpServer, ServerError};
use stacklog::lifecycle::{Lifecycle, RecordingExit, Signal};
use stacklog::observability::{Logger, SharedBuffer, Sink};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live server on an ephemeral port whose records land in memory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub buffer: SharedBuffer,
    pub exit: RecordingExit,
    pub lifecycle: Arc<Lifecycle>,
    pub signals: mpsc::UnboundedSender<Signal>,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

/// Start `routes` behind the access log with the given logger config.
pub async fn start_server(routes: Router, config: LoggerConfig) -> TestServer {
    let buffer = SharedBuffer::new();
    let settings = Arc::new(Settings::with_host(&config, Some("test-host".into())));
    let logger = Logger::with_producer(
        settings,
        "test-host:1:0",
        Sink::new(buffer.clone()),
    );

    let exit = RecordingExit::new();
    let lifecycle = Arc::new(Lifecycle::new(logger.clone(), Arc::new(exit.clone())));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (signals, rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(routes, logger, lifecycle.clone());
    let handle = tokio::spawn(server.run(listener, rx));

    TestServer {
        addr,
        buffer,
        exit,
        lifecycle,
        signals,
        handle,
    }
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until at least `count` records were written, then return all of them.
    pub async fn wait_for_records(&self, count: usize) -> Vec<Value> {
        for _ in 0..200 {
            let records = self.buffer.records();
            if records.len() >= count {
                return records;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {count} records, got:\n{}",
            self.buffer.contents()
        );
    }
}

/// Operation id of a record.
pub fn operation_id(record: &Value) -> &str {
    record["logging.googleapis.com/operation"]["id"]
        .as_str()
        .unwrap_or_default()
}
