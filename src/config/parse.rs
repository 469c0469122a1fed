//! Environment value parsing helpers.
//!
//! All helpers take a lookup closure instead of reading `std::env` directly,
//! so tests can resolve settings from a map without touching process state.

use std::str::FromStr;

use tracing::info;

use super::ConfigError;

/// Look up a key, treating an empty value as unset.
pub fn lookup_opt<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.is_empty())
}

/// Resolve a numeric setting, falling back to `default` when unset.
///
/// A present but malformed value is an error, never silently defaulted.
pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match lookup_opt(lookup, key) {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .map_err(|e: T::Err| ConfigError::Parse {
                    key: key.to_string(),
                    value: value.clone(),
                    error: e.to_string(),
                })?;
            info!(key, value = %parsed, "Using configured value");
            Ok(parsed)
        }
        None => {
            info!(key, value = %default, "Using default value");
            Ok(default)
        }
    }
}

/// Parse a boolean flag. Treats "1" and "true" (case-insensitive) as true.
pub fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup_opt(lookup, key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
