//! Capture of process-fatal faults.
//!
//! # Responsibilities
//! - Panics anywhere in the process → `uncaughtException`
//! - Supervised background tasks that fail → `unhandledRejection`
//!
//! Both report through [`Lifecycle::on_fault`], which writes one CRITICAL
//! record and then exits with code 1.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::controller::Lifecycle;
use crate::observability::events::{describe_error, FaultKind};

/// Report every panic as a fatal fault.
///
/// The previously installed hook still runs first, so the usual panic message
/// keeps reaching stderr.
pub fn install_panic_hook(lifecycle: Arc<Lifecycle>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);

        let mut description = info.to_string();
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            description.push_str("\nstack backtrace:\n");
            description.push_str(&backtrace.to_string());
        }

        lifecycle.on_fault(FaultKind::UncaughtException, description);
    }));
}

/// Spawn a background task whose failure is fatal to the process.
pub fn spawn_supervised<F, E>(lifecycle: Arc<Lifecycle>, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Supervised task failed");
            lifecycle.on_fault(FaultKind::UnhandledRejection, describe_error(&e));
        }
    })
}
