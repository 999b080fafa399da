//! Configuration module - environment variable parsing

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the match API (e.g. https://nabo.example.com)
    pub api_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Timer periods for the match controller
    pub timing: Timing,
}

/// Timer periods used by the match controller.
///
/// Carried separately from [`Config`] so tests can shrink them.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// Round duration before the automatic timeout guess
    pub round_time: Duration,
    /// Reveal duration before advancing to the next round
    pub reveal_time: Duration,
    /// Lobby poll period
    pub lobby_poll: Duration,
    /// Round-result poll period
    pub round_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            round_time: Duration::from_secs(30),
            reveal_time: Duration::from_secs(10),
            lobby_poll: Duration::from_millis(1500),
            round_poll: Duration::from_millis(2000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: env::var("NABO_API_URL").map_err(|_| ConfigError::Missing("NABO_API_URL"))?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            timing: Timing {
                round_time: Duration::from_secs(parse_or("ROUND_TIME_SECS", 30)?),
                reveal_time: Duration::from_secs(parse_or("REVEAL_TIME_SECS", 10)?),
                lobby_poll: Duration::from_millis(parse_or("LOBBY_POLL_MS", 1500)?),
                round_poll: Duration::from_millis(parse_or("ROUND_POLL_MS", 2000)?),
            },
        })
    }
}

/// Parse an optional numeric variable, falling back to a default
fn parse_or(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {raw}")]
    Invalid { key: &'static str, raw: String },
}
