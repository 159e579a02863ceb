//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::client_pool::DEFAULT_POOL_CAPACITY;
use crate::domain::exchange::DEFAULT_EXCHANGE_CAPACITY;

/// Default bind address (the hub's historical port).
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9977";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is set but is not a socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    InvalidListenAddr {
        /// The offending value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Buffer size of each intake channel of the root exchange.
    pub exchange_capacity: usize,

    /// Buffer size of each pool's inbox (and nested exchange).
    pub pool_capacity: usize,

    /// Per-client delivery buffer; a full buffer drops messages.
    pub client_buffer: usize,

    /// Interval between SSE keep-alive comments; `None` disables them.
    pub sse_keep_alive: Option<Duration>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9977)),
            exchange_capacity: DEFAULT_EXCHANGE_CAPACITY,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            client_buffer: 64,
            sse_keep_alive: Some(Duration::from_secs(15)),
            log_format: LogFormat::Text,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is missing or unparseable.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidListenAddr`] if `LISTEN_ADDR` is set
    /// but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let value =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = value
            .parse()
            .map_err(|source| ConfigError::InvalidListenAddr { value, source })?;

        let keep_alive_secs: u64 = parse_env("SSE_KEEP_ALIVE_SECS", 15);
        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            exchange_capacity: parse_env("EXCHANGE_CAPACITY", defaults.exchange_capacity),
            pool_capacity: parse_env("POOL_CAPACITY", defaults.pool_capacity),
            client_buffer: parse_env("CLIENT_BUFFER", defaults.client_buffer),
            sse_keep_alive: (keep_alive_secs > 0).then(|| Duration::from_secs(keep_alive_secs)),
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
