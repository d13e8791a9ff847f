//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → channel → controller.rs
//!
//! Controller (controller.rs):
//!     first signal → record → Shutdown::trigger(timeout)
//!     server stopped → record → exit 0
//!
//! Faults (fault.rs):
//!     panic / failed supervised task → CRITICAL record → exit 1
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → drain (bounded by timeout)
//! ```

pub mod controller;
pub mod fault;
pub mod shutdown;
pub mod signals;

pub use controller::{Lifecycle, LifecycleState, ProcessExit, RecordingExit, StdExit};
pub use fault::{install_panic_hook, spawn_supervised};
pub use shutdown::Shutdown;
pub use signals::Signal;
