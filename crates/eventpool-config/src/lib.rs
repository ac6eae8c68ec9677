#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Configuration for the eventpool dispatcher.
//!
//! A single TOML file with two sections:
//!
//! ```toml
//! [dispatcher]
//! capacity = 16
//! wait_timeout_ms = 0
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! directives = ["eventpool_events=debug"]
//! ```
//!
//! Every field has a default, so an empty file is valid. `EVENTPOOL_*`
//! environment variables fill fields the file leaves unset; they never
//! override a value the file sets.
//!
//! ```rust
//! use std::collections::HashMap;
//! use eventpool_config::loader;
//!
//! let config = loader::load_str("[dispatcher]\ncapacity = 4\n", &HashMap::new()).unwrap();
//! assert_eq!(config.dispatcher.capacity, 4);
//! ```
//!
//! This crate depends on no other eventpool crate. The events and telemetry
//! crates convert these sections into their own option types behind their
//! `config` features.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Config {
    /// Load configuration from a file, with `EVENTPOOL_*` env fallbacks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse configuration from a TOML string. The process environment is
    /// not consulted.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source is malformed or fails
    /// validation.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        loader::load_str(source, &std::collections::HashMap::<String, String>::new())
    }
}
