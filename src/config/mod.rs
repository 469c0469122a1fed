//! Startup configuration resolved from the environment
//!
//! Every setting is optional and falls back to a documented default.
//! A malformed numeric value is fatal: the caller is expected to exit
//! before the listening socket is opened.

mod parse;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use parse::{flag, lookup_opt, parse_or};

/// Default listening port
pub const DEFAULT_PORT: u16 = 8000;

/// Default delay before the socket is opened
pub const DEFAULT_LISTEN_DELAY_SECONDS: u64 = 10;

/// Default delay before `/livez` starts succeeding
pub const DEFAULT_LIVENESS_DELAY_SECONDS: u64 = 2;

/// Default delay before `/readyz` and `/home` start succeeding
pub const DEFAULT_READINESS_DELAY_SECONDS: u64 = 10;

pub const DEFAULT_STARTUP_FILE: &str = "/tmp/startup";
pub const DEFAULT_LIVENESS_FILE: &str = "/tmp/liveness";
pub const DEFAULT_READINESS_FILE: &str = "/tmp/readiness";

/// Errors that can occur while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to convert {key}={value:?}: {error}")]
    Parse {
        key: String,
        value: String,
        error: String,
    },
}

/// Marker files announcing phase completion to an external watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelPaths {
    pub startup: PathBuf,
    pub liveness: PathBuf,
    pub readiness: PathBuf,
}

impl SentinelPaths {
    /// All marker paths, startup first
    pub fn all(&self) -> [&PathBuf; 3] {
        [&self.startup, &self.liveness, &self.readiness]
    }
}

/// Immutable settings bundle handed to the probe core at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub listen_delay: Duration,
    pub liveness_delay: Duration,
    pub readiness_delay: Duration,
    pub response_delay: Duration,
    /// Successful `/livez` responses before it starts failing (0 = unlimited)
    pub liveness_success_max: u64,
    /// Successful `/readyz` responses before it starts failing (0 = unlimited)
    pub readiness_success_max: u64,
    /// `None` unless sentinel signaling is enabled
    pub sentinels: Option<SentinelPaths>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            listen_delay: Duration::from_secs(DEFAULT_LISTEN_DELAY_SECONDS),
            liveness_delay: Duration::from_secs(DEFAULT_LIVENESS_DELAY_SECONDS),
            readiness_delay: Duration::from_secs(DEFAULT_READINESS_DELAY_SECONDS),
            response_delay: Duration::ZERO,
            liveness_success_max: 0,
            readiness_success_max: 0,
            sentinels: None,
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let listen_delay = parse_or(&lookup, "LISTEN_DELAY_SECONDS", DEFAULT_LISTEN_DELAY_SECONDS)?;
        let liveness_delay = parse_or(
            &lookup,
            "LIVENESS_DELAY_SECONDS",
            DEFAULT_LIVENESS_DELAY_SECONDS,
        )?;
        let readiness_delay = parse_or(
            &lookup,
            "READINESS_DELAY_SECONDS",
            DEFAULT_READINESS_DELAY_SECONDS,
        )?;
        let response_delay = parse_or(&lookup, "RESPONSE_DELAY_MILLISECONDS", 0u64)?;
        let liveness_success_max = parse_or(&lookup, "LIVENESS_SUCCESS_MAX", 0u64)?;
        let readiness_success_max = parse_or(&lookup, "READINESS_SUCCESS_MAX", 0u64)?;

        Ok(Self {
            port,
            listen_delay: Duration::from_secs(listen_delay),
            liveness_delay: Duration::from_secs(liveness_delay),
            readiness_delay: Duration::from_secs(readiness_delay),
            response_delay: Duration::from_millis(response_delay),
            liveness_success_max,
            readiness_success_max,
            sentinels: sentinel_paths(&lookup),
        })
    }
}

/// Sentinel signaling is on when explicitly enabled or when any path is given
fn sentinel_paths<F>(lookup: &F) -> Option<SentinelPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let startup = lookup_opt(lookup, "STARTUP_FILE");
    let liveness = lookup_opt(lookup, "LIVENESS_FILE");
    let readiness = lookup_opt(lookup, "READINESS_FILE");

    let any_path = startup.is_some() || liveness.is_some() || readiness.is_some();
    if !flag(lookup, "SENTINEL_FILES") && !any_path {
        info!("Sentinel files disabled");
        return None;
    }

    let paths = SentinelPaths {
        startup: startup.unwrap_or_else(|| DEFAULT_STARTUP_FILE.to_string()).into(),
        liveness: liveness
            .unwrap_or_else(|| DEFAULT_LIVENESS_FILE.to_string())
            .into(),
        readiness: readiness
            .unwrap_or_else(|| DEFAULT_READINESS_FILE.to_string())
            .into(),
    };
    info!(
        startup = %paths.startup.display(),
        liveness = %paths.liveness.display(),
        readiness = %paths.readiness.display(),
        "Sentinel files enabled"
    );
    Some(paths)
}
