//! Runtime configuration resolved from the process environment.
//!
//! [`Settings::from_env`] never fails: absent or malformed variables fall back
//! to defaults so a bare `flowise-mcp` invocation always starts against a
//! local Flowise instance.
//!
//! Recognized variables:
//!
//! | Variable               | Default                 | Meaning                       |
//! |------------------------|-------------------------|-------------------------------|
//! | `FLOWISE_API_ENDPOINT` | `http://localhost:3000` | Base URL of the Flowise API   |
//! | `FLOWISE_API_KEY`      | unset                   | Bearer token; unset = no auth |
//! | `FLOWISE_LOG_LEVEL`    | `warn`                  | Log verbosity                 |
//! | `FLOWISE_TIMEOUT_SECS` | `60`                    | Per-request timeout           |

use log::LevelFilter;
use std::env;
use std::time::Duration;

/// Default Flowise endpoint when `FLOWISE_API_ENDPOINT` is unset.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// Default per-request timeout in seconds when `FLOWISE_TIMEOUT_SECS` is unset
/// or malformed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the shared [`FlowiseClient`](crate::FlowiseClient).
///
/// Resolved once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the Flowise instance, without a trailing slash.
    pub endpoint: String,
    /// API key sent as a bearer token; `None` means unauthenticated requests.
    pub api_key: Option<String>,
    /// Log verbosity applied to the process-wide logger.
    pub log_level: LevelFilter,
    /// Overall timeout applied to every outbound request.
    pub request_timeout: Duration,
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults for
    /// anything absent or unparseable. Reads the environment and nothing else.
    pub fn from_env() -> Self {
        let endpoint = env::var("FLOWISE_API_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let api_key = env::var("FLOWISE_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let log_level = env::var("FLOWISE_LOG_LEVEL")
            .ok()
            .and_then(|v| parse_log_level(&v))
            .unwrap_or(LevelFilter::Warn);

        let request_timeout = env::var("FLOWISE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| parse_timeout_secs(&v))
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Settings {
            endpoint,
            api_key,
            log_level,
            request_timeout,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            log_level: LevelFilter::Warn,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Parse a log level name, accepting the Python-style `WARNING` alias.
/// Unrecognized names yield `None` so the caller falls back to the default.
fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Parse a positive timeout in seconds. Zero and garbage yield `None`.
fn parse_timeout_secs(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}
