//! Run configuration
//!
//! All run parameters are resolved from the environment exactly once at
//! startup and carried as a single immutable value. A missing or invalid
//! required parameter fails the whole run before any HTTP call is made.

use std::time::Duration;

use crate::error::ConfigError;
use crate::models::LockingMode;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_ACTORS: usize = 50;
const DEFAULT_ITERATIONS: u64 = 100;
const DEFAULT_MAX_DURATION_SECS: u64 = 120;

/// Immutable run parameters, shared read-only by every actor
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Account service base URL, no trailing slash
    pub base_url: String,
    /// Target account id, opaque to the harness. Required, no default.
    pub account_id: String,
    pub mode: LockingMode,
    /// Number of concurrent actors
    pub actors: usize,
    /// Total shared iteration budget across all actors
    pub iterations: u64,
    /// Wall-clock cap; hitting it makes the run partial, not failed
    pub max_duration: Duration,
}

impl RunConfig {
    /// Resolve from process environment variables:
    /// `BASE_URL`, `ACCOUNT_ID` (required), `MODE`, `ACTORS`, `ITERATIONS`,
    /// `MAX_DURATION_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary lookup. Validation happens here, once.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let account_id = lookup("ACCOUNT_ID")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingParameter("ACCOUNT_ID"))?;

        let base_url = lookup("BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidParameter {
                name: "BASE_URL",
                value: base_url,
            });
        }

        let mode = match lookup("MODE") {
            Some(raw) => LockingMode::parse(&raw).ok_or(ConfigError::InvalidParameter {
                name: "MODE",
                value: raw,
            })?,
            None => LockingMode::Optimistic,
        };

        let actors = parse_or("ACTORS", &lookup, DEFAULT_ACTORS)?;
        if actors == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "ACTORS",
                value: "0".to_string(),
            });
        }
        let iterations = parse_or("ITERATIONS", &lookup, DEFAULT_ITERATIONS)?;
        let max_duration_secs = parse_or("MAX_DURATION_SECS", &lookup, DEFAULT_MAX_DURATION_SECS)?;

        Ok(RunConfig {
            base_url,
            account_id,
            mode,
            actors,
            iterations,
            max_duration: Duration::from_secs(max_duration_secs),
        })
    }
}

/// Parse an optional numeric override; an unparseable value is a startup
/// failure rather than a silent fallback to the default.
fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    lookup: impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidParameter { name, value: raw }),
        None => Ok(default),
    }
}
