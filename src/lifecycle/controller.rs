//! Process lifecycle state machine.
//!
//! ```text
//! Running ──SIGTERM/SIGINT──▶ ShuttingDown ──server stopped──▶ Terminated (exit 0)
//!    │                             │
//!    └──────────fault──────────────┴──────────────────────────▶ Terminated (exit 1)
//! ```
//!
//! Every transition writes its record before the process exit is requested.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::lifecycle::signals::Signal;
use crate::observability::events::{Event, FaultKind, ServerPhase};
use crate::observability::Logger;

/// Process termination seam.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

/// Terminates the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdExit;

impl ProcessExit for StdExit {
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    ShuttingDown,
    Terminated,
}

pub struct Lifecycle {
    logger: Logger,
    state: Mutex<LifecycleState>,
    faulted: AtomicBool,
    exit: Arc<dyn ProcessExit>,
}

impl Lifecycle {
    pub fn new(logger: Logger, exit: Arc<dyn ProcessExit>) -> Self {
        Self {
            logger,
            state: Mutex::new(LifecycleState::Running),
            faulted: AtomicBool::new(false),
            exit,
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// Post-start hook.
    pub fn server_started(&self) {
        self.logger.dispatch(Event::ServerLifecycle(ServerPhase::Started));
    }

    /// Handle a delivered signal.
    ///
    /// The first SIGTERM/SIGINT logs and returns the shutdown timeout the
    /// server must honor. Any later signal gets the default disposition: the
    /// process exits at once with the conventional signal exit code and no
    /// record.
    pub fn on_signal(&self, signal: Signal) -> Option<Duration> {
        let previous = {
            let mut state = self.lock_state();
            let previous = *state;
            if previous == LifecycleState::Running {
                *state = LifecycleState::ShuttingDown;
            }
            previous
        };

        match previous {
            LifecycleState::Running => {
                self.logger.dispatch(Event::ProcessSignal(signal));
                Some(self.logger.settings().shutdown_timeout())
            }
            LifecycleState::ShuttingDown => {
                tracing::warn!(signal = %signal, "Repeated signal during shutdown, exiting immediately");
                self.exit.exit(signal.default_exit_code());
                None
            }
            LifecycleState::Terminated => None,
        }
    }

    /// Post-stop hook. Completes a signal-initiated shutdown with exit code 0.
    pub fn server_stopped(&self) {
        self.logger.dispatch(Event::ServerLifecycle(ServerPhase::Stopped));

        let finishing = {
            let mut state = self.lock_state();
            let finishing = *state == LifecycleState::ShuttingDown;
            if finishing {
                *state = LifecycleState::Terminated;
            }
            finishing
        };

        if finishing {
            self.exit.exit(0);
        }
    }

    /// Report a fatal fault: one CRITICAL record, then exit code 1.
    ///
    /// Preempts a graceful shutdown in progress. Only the first fault is
    /// reported.
    pub fn on_fault(&self, kind: FaultKind, description: impl Into<String>) {
        if self.faulted.swap(true, Ordering::SeqCst) {
            return;
        }

        *self.lock_state() = LifecycleState::Terminated;
        self.logger.dispatch(Event::FatalFault {
            kind,
            description: description.into(),
        });
        self.exit.exit(1);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("faulted", &self.faulted.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// [`ProcessExit`] that records exit codes instead of exiting.
#[derive(Debug, Clone, Default)]
pub struct RecordingExit(Arc<Mutex<Vec<i32>>>);

impl RecordingExit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(&self) -> Vec<i32> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ProcessExit for RecordingExit {
    fn exit(&self, code: i32) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(code);
    }
}
