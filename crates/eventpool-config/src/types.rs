//! Configuration types for the eventpool dispatcher.
//!
//! Every struct implements [`Default`] so that an empty file, or a bare
//! `[section]` header, yields a working configuration.

use serde::{Deserialize, Serialize};

/// Default pool capacity.
pub const DEFAULT_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event pool sizing and request waits.
    pub dispatcher: DispatcherSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// DispatcherSection
// ---------------------------------------------------------------------------

/// Event pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSection {
    /// Number of event slots. Fixed once the manager is built.
    pub capacity: usize,
    /// How long a request producer waits for subscribers, in milliseconds.
    /// `0` waits indefinitely.
    pub wait_timeout_ms: u64,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            wait_timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["eventpool_events=trace"]`).
    pub directives: Vec<String>,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
