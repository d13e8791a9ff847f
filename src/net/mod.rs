//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → axum::serve accept loop
//!     → connection.rs (capture local/peer addresses once per connection)
//!     → ConnectInfo<ConnectionInfo> request extension
//!     → access log middleware (URL host fallback, client IP fallback)
//! ```

pub mod connection;

pub use connection::ConnectionInfo;
