//! Environment variable fallbacks.
//!
//! Env vars are a **fallback**, not an override: they only fill fields the
//! config file left unset.

use std::collections::HashMap;

use tracing::{debug, warn};

/// Expected TOML type of a field an env var can fill.
#[derive(Clone, Copy)]
enum FieldKind {
    Integer,
    String,
}

/// Mapping from environment variable name to config field.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    field: &'static str,
    kind: FieldKind,
}

/// All supported `EVENTPOOL_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "EVENTPOOL_CAPACITY",
        section: "dispatcher",
        field: "capacity",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "EVENTPOOL_WAIT_TIMEOUT_MS",
        section: "dispatcher",
        field: "wait_timeout_ms",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "EVENTPOOL_LOG_LEVEL",
        section: "logging",
        field: "level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "EVENTPOOL_LOG_FORMAT",
        section: "logging",
        field: "format",
        kind: FieldKind::String,
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply env var fallbacks to fields the parsed file did not set.
///
/// Values that do not parse as the field's type are skipped with a warning.
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    raw: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let Some(root) = raw.as_table_mut() else {
        return 0;
    };
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let section = root
            .entry(mapping.section)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
        let Some(section) = section.as_table_mut() else {
            continue;
        };
        if section.contains_key(mapping.field) {
            continue;
        }

        let value = match mapping.kind {
            FieldKind::Integer => match val.trim().parse::<i64>() {
                Ok(n) => toml::Value::Integer(n),
                Err(e) => {
                    warn!(var = mapping.var_name, error = %e, "ignoring non-integer env var");
                    continue;
                },
            },
            FieldKind::String => toml::Value::String(val.clone()),
        };

        debug!(
            var = mapping.var_name,
            field = format!("{}.{}", mapping.section, mapping.field),
            "applying env var fallback"
        );
        section.insert(mapping.field.to_owned(), value);
        count = count.saturating_add(1);
    }

    count
}
