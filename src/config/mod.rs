//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, per-field merge over defaults)
//!     → AppConfig
//!     → settings.rs (resolve env fallbacks)
//!     → Settings (immutable, shared via Arc to the logger and lifecycle)
//! ```
//!
//! # Design Decisions
//! - Settings are built once at startup and never re-merged
//! - Every field has a default; malformed values fall back instead of failing
//! - No semantic validation beyond what serde types enforce

pub mod loader;
pub mod schema;
pub mod settings;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{AppConfig, ListenerConfig, LoggerConfig, ObservabilityConfig};
pub use settings::Settings;
