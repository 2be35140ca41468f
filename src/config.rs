//! Library-level configuration for [`Downloader`](crate::Downloader).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Allowed range for HTTP connect/read timeouts, in seconds.
const TIMEOUT_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

/// Upper bound for the progress throttle interval.
const MAX_PROGRESS_INTERVAL_MS: u64 = 60_000;

/// Errors from building a [`Downloader`](crate::Downloader).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value is out of range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Human-readable accepted range.
        expected: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Settings shared by every fetch made through one [`Downloader`](crate::Downloader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum gap between successive reads, in seconds.
    pub read_timeout_secs: u64,
    /// Directory for generated destinations; the OS temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
    /// Minimum interval between progress callbacks; `0` reports every chunk.
    pub progress_interval_ms: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            temp_dir: None,
            progress_interval_ms: 0,
        }
    }
}

impl DownloaderConfig {
    /// Validates values against their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.progress_interval_ms > MAX_PROGRESS_INTERVAL_MS {
            return Err(ConfigError::OutOfRange {
                field: "progress_interval_ms",
                value: self.progress_interval_ms,
                expected: "0..=60000",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if TIMEOUT_SECS_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "1..=3600",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DownloaderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.read_timeout_secs, 300);
        assert_eq!(config.progress_interval(), Duration::ZERO);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = DownloaderConfig {
            connect_timeout_secs: 0,
            ..DownloaderConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            err.to_string().contains("connect_timeout_secs"),
            "got: {err}"
        );
    }

    #[test]
    fn test_oversized_read_timeout_rejected() {
        let config = DownloaderConfig {
            read_timeout_secs: 3601,
            ..DownloaderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "read_timeout_secs",
                value: 3601,
                ..
            })
        ));
    }

    #[test]
    fn test_progress_interval_bound() {
        let config = DownloaderConfig {
            progress_interval_ms: 60_001,
            ..DownloaderConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
