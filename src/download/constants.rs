//! Constants for the download module (timeouts, progress).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Deadline used when the caller does not supply one.
///
/// The watchdog is still armed; tokio clamps the timer to its far-future instant.
pub const UNBOUNDED_TIMEOUT: Duration = Duration::MAX;

/// Prefix for generated temporary destination files.
pub const TEMP_FILE_PREFIX: &str = "download_";

/// Suffix for generated temporary destination files.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";
