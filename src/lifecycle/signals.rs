//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM/SIGINT handlers once, at startup
//! - Translate them into [`Signal`] values on a channel
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The listener only forwards; what a signal means is decided by the
//!   lifecycle controller, so tests can feed signals through a plain channel

use tokio::sync::mpsc;

/// Process signals that trigger a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Term,
    Int,
}

impl Signal {
    pub const fn name(&self) -> &'static str {
        match self {
            Signal::Term => "SIGTERM",
            Signal::Int => "SIGINT",
        }
    }

    /// Exit code of a process terminated by this signal's default disposition.
    pub const fn default_exit_code(&self) -> i32 {
        match self {
            Signal::Term => 128 + 15,
            Signal::Int => 128 + 2,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Install signal handlers and forward every delivery to the returned channel.
///
/// Must be called from within a Tokio runtime.
pub fn listen() -> mpsc::UnboundedReceiver<Signal> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(forward(tx));
    rx
}

#[cfg(unix)]
async fn forward(tx: mpsc::UnboundedSender<Signal>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut interrupt) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(terminate), Ok(interrupt)) => (terminate, interrupt),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

    loop {
        let received = tokio::select! {
            Some(()) = terminate.recv() => Signal::Term,
            Some(()) = interrupt.recv() => Signal::Int,
            else => break,
        };

        tracing::debug!(signal = %received, "Signal received");
        if tx.send(received).is_err() {
            break;
        }
    }
}

#[cfg(not(unix))]
async fn forward(tx: mpsc::UnboundedSender<Signal>) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        if tx.send(Signal::Int).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_exit_codes() {
        assert_eq!(Signal::Term.to_string(), "SIGTERM");
        assert_eq!(Signal::Int.name(), "SIGINT");
        assert_eq!(Signal::Term.default_exit_code(), 143);
        assert_eq!(Signal::Int.default_exit_code(), 130);
    }
}
