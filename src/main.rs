//! stacklog demo server.
//!
//! Serves a handful of routes through the access log so the records on stdout
//! can be inspected.
//!
//! ```text
//! GET  /health      plain text, opted out of access logging
//! GET  /users/{id}  JSON user, 404 for id 0
//! POST /echo        echoes the request body
//! GET  /fail        request error (500, ERROR record)
//! GET  /log         request-scoped tagged log
//! GET  /panic       fatal fault (CRITICAL record, exit 1)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use stacklog::config::{load_or_default, Settings};
use stacklog::http::{exclude_route, ApiError, HttpServer, RequestContext};
use stacklog::lifecycle::{install_panic_hook, signals, Lifecycle, StdExit};
use stacklog::observability::logging::{init_logging, with_bootstrap};
use stacklog::observability::metrics::init_metrics;
use stacklog::observability::{Logger, Sink};

#[derive(Parser, Debug)]
#[command(name = "stacklog", about = "Structured logging demo server", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = with_bootstrap(|| load_or_default(cli.config.as_deref()));
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability.log_level);
    tracing::info!("stacklog v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let settings = Arc::new(Settings::from_config(&config.logger));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        service = ?settings.service_name(),
        shutdown_timeout_ms = config.logger.shutdown_timeout,
        excluded_paths = config.logger.exclude.len(),
        disabled = settings.disabled(),
        "Configuration loaded"
    );

    let logger = Logger::new(settings, Sink::stdout());
    let lifecycle = Arc::new(Lifecycle::new(logger.clone(), Arc::new(StdExit)));
    install_panic_hook(lifecycle.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let signals = signals::listen();

    HttpServer::new(routes(), logger, lifecycle)
        .run(listener, signals)
        .await?;

    Ok(())
}

fn routes() -> Router {
    Router::new()
        .route(
            "/health",
            get(health).layer(middleware::from_fn(exclude_route)),
        )
        .route("/users/{id}", get(get_user))
        .route("/echo", post(echo))
        .route("/fail", get(fail))
        .route("/log", get(log_event))
        .route("/panic", get(panic_now))
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct User {
    id: u64,
    name: String,
}

async fn get_user(Path(id): Path<u64>) -> Result<Json<User>, ApiError> {
    if id == 0 {
        return Err(ApiError::not_found(format!("user {id} does not exist")));
    }
    Ok(Json(User {
        id,
        name: format!("user-{id}"),
    }))
}

async fn echo(body: Bytes) -> Bytes {
    body
}

async fn fail() -> Result<StatusCode, ApiError> {
    let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    Err(ApiError::internal("user store unavailable", cause))
}

async fn log_event(Extension(context): Extension<RequestContext>) -> StatusCode {
    context.log(
        ["info", "audit"],
        &serde_json::json!({ "event": "demo", "request": context.id() }),
    );
    StatusCode::NO_CONTENT
}

async fn panic_now() -> StatusCode {
    panic!("panic requested by client");
}
