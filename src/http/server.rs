//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the application routes with the request-id and access-log layers
//! - Bind to a listener with per-connection address info
//! - Route signals through the lifecycle controller
//! - Drain in-flight requests within the configured shutdown timeout

use std::future::IntoFuture;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::http::middleware::AccessLogLayer;
use crate::lifecycle::{Lifecycle, Shutdown, Signal};
use crate::net::ConnectionInfo;
use crate::observability::Logger;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server with lifecycle logging.
pub struct HttpServer {
    app: Router,
    lifecycle: Arc<Lifecycle>,
    shutdown: Shutdown,
}

impl HttpServer {
    pub fn new(routes: Router, logger: Logger, lifecycle: Arc<Lifecycle>) -> Self {
        Self {
            app: Self::build_router(routes, logger),
            lifecycle,
            shutdown: Shutdown::new(),
        }
    }

    /// Layers run outermost-first: the request id is assigned before the
    /// access log reads it.
    fn build_router(routes: Router, logger: Logger) -> Router {
        routes
            .layer(AccessLogLayer::new(logger))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Handle to request shutdown without a signal.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run until a signal (or the shutdown handle) stops the server.
    pub async fn run(
        self,
        listener: TcpListener,
        mut signals: mpsc::UnboundedReceiver<Signal>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let Self {
            app,
            lifecycle,
            shutdown,
        } = self;

        let signal_task = {
            let lifecycle = lifecycle.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                while let Some(signal) = signals.recv().await {
                    if let Some(timeout) = lifecycle.on_signal(signal) {
                        shutdown.trigger(timeout);
                    }
                }
            })
        };

        let graceful = {
            let shutdown = shutdown.clone();
            async move {
                shutdown.requested().await;
            }
        };
        let serve = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<ConnectionInfo>(),
        )
        .with_graceful_shutdown(graceful);

        tracing::info!(address = %addr, "HTTP server started");
        lifecycle.server_started();

        let result = tokio::select! {
            result = serve.into_future() => result,
            timeout = async {
                let timeout = shutdown.requested().await;
                tokio::time::sleep(timeout).await;
                timeout
            } => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "Shutdown timeout elapsed, abandoning in-flight requests"
                );
                Ok(())
            }
        };

        signal_task.abort();
        tracing::info!("HTTP server stopped");
        lifecycle.server_stopped();

        result.map_err(ServerError::from)
    }
}
