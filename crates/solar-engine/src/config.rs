//! Engine configuration.
//!
//! [`EngineConfig`] is plain serde data, normally loaded once at startup from
//! a JSON file. Every field has a default, so a partial file (or `{}`) is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON for [`EngineConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the game loop cannot run with.
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings for the [`GameLoop`](crate::game_loop::GameLoop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed simulation step in seconds. Must be positive and finite.
    pub fixed_dt: f64,
    /// Longest frame time, in seconds, a single `advance` call will simulate.
    /// Longer frames are clamped so a stall cannot queue unbounded ticks.
    pub max_frame_time: f64,
    /// Entities to reserve room for up front.
    pub entity_reserve: usize,
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    /// 60 Hz, quarter-second frame clamp, `info` logging.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_frame_time: 0.25,
            entity_reserve: 0,
            log_filter: "info".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Reject values the game loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "fixed_dt",
                reason: format!("must be positive and finite, got {}", self.fixed_dt),
            });
        }
        if !self.max_frame_time.is_finite() || self.max_frame_time < self.fixed_dt {
            return Err(ConfigError::Invalid {
                field: "max_frame_time",
                reason: format!(
                    "must be finite and at least fixed_dt ({}), got {}",
                    self.fixed_dt, self.max_frame_time
                ),
            });
        }
        Ok(())
    }
}
