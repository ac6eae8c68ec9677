//! Logging setup for the eventpool dispatcher.
//!
//! The dispatcher crates only emit `tracing` events; this crate installs the
//! subscriber that formats and writes them.
//!
//! # Example
//!
//! ```rust,no_run
//! use eventpool_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), eventpool_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("eventpool_events=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("dispatcher starting");
//! # Ok(())
//! # }
//! ```
//!
//! With the `config` feature, a `[logging]` section converts directly:
//! `LogConfig::from(&config.logging)`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod bridge;
mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
