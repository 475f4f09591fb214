//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::util::time::{DEFAULT_ACTION_EXPIRATION_SECS, DEFAULT_TICK_RATE};

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate: u32,

    /// Recorded session, one JSON message per line
    pub replay_path: PathBuf,
    /// Delay between replayed frames
    pub replay_interval_ms: u64,

    /// Horizon for actions this client builds
    pub action_expiration_secs: i64,
    /// Seed for the wandering test player, off when unset
    pub wander_seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let tick_rate = parse_var("TICK_RATE")?.unwrap_or(DEFAULT_TICK_RATE);
        if tick_rate == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_RATE",
                value: tick_rate.to_string(),
            });
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            tick_rate,

            replay_path: env::var("REPLAY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("replay.jsonl")),
            replay_interval_ms: parse_var("REPLAY_INTERVAL_MS")?.unwrap_or(100),

            action_expiration_secs: parse_var("ACTION_EXPIRATION_SECS")?
                .unwrap_or(DEFAULT_ACTION_EXPIRATION_SECS),
            wander_seed: parse_var("WANDER_SEED")?,
        })
    }
}

/// Read and parse an optional variable. Unset is `None`; unparseable is an error.
fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Process environment is shared between test threads, so every case
    // lives in one test.
    #[test]
    fn reads_defaults_and_rejects_garbage() {
        for var in [
            "TICK_RATE",
            "REPLAY_PATH",
            "REPLAY_INTERVAL_MS",
            "ACTION_EXPIRATION_SECS",
            "WANDER_SEED",
        ] {
            env::remove_var(var);
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.tick_rate, DEFAULT_TICK_RATE);
        assert_eq!(config.replay_path, PathBuf::from("replay.jsonl"));
        assert_eq!(config.replay_interval_ms, 100);
        assert_eq!(config.wander_seed, None);

        env::set_var("WANDER_SEED", "42");
        assert_eq!(Config::from_env().unwrap().wander_seed, Some(42));
        env::remove_var("WANDER_SEED");

        env::set_var("TICK_RATE", "fast");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { var: "TICK_RATE", .. })
        ));
        env::set_var("TICK_RATE", "0");
        assert!(Config::from_env().is_err());
        env::remove_var("TICK_RATE");
    }
}
