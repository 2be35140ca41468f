//! Error types for the download module.
//!
//! Three layers of failure exist for one fetch:
//! - [`InvalidArgument`] is the only error that escapes to the caller, and it
//!   escapes before any I/O happens (from [`DownloadRequest::new`]).
//! - [`TransferError`] describes transport-level faults (network, HTTP status,
//!   writing the destination file).
//! - [`UnexpectedError`] covers everything outside the transfer itself
//!   (preparing the destination, a transfer task that panicked).
//!
//! [`DownloadRequest::new`]: super::DownloadRequest::new

use std::path::PathBuf;

use thiserror::Error;

/// The request was rejected before any filesystem or network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    /// Remote address was empty or whitespace only.
    #[error("remote address must not be empty")]
    EmptyRemoteAddress,
}

/// Transport-level failure while fetching a remote resource.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client's own connect/read timeout elapsed.
    ///
    /// This is distinct from the caller's deadline, which surfaces as a
    /// cancellation rather than a transfer error.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing the destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The remote address is not a valid absolute URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl TransferError {
    /// Creates a network error from a reqwest error.
    ///
    /// Client-side timeouts reported by reqwest are promoted to [`Self::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns true when an outer retry policy could reasonably try again.
    ///
    /// Network failures, client timeouts, 408/429 and 5xx responses are
    /// transient. Invalid URLs, other 4xx responses and local IO are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => matches!(status, 408 | 429 | 500..=599),
            Self::Io { .. } | Self::InvalidUrl { .. } => false,
        }
    }

    /// Returns the HTTP status code, if this is a status error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure outside the transport: anything the transfer path did not anticipate.
#[derive(Debug, Error)]
pub enum UnexpectedError {
    /// The destination could not be generated or its directory created.
    #[error("failed to prepare destination {path}: {source}")]
    Destination {
        /// Path being prepared.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The transfer task panicked or was aborted.
    #[error("transfer task failed: {reason}")]
    TaskFailed {
        /// Panic message or abort description.
        reason: String,
    },
}

impl UnexpectedError {
    /// Creates a destination preparation error.
    pub fn destination(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Destination {
            path: path.into(),
            source,
        }
    }

    /// Creates a task failure error.
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }
}

// Like the rest of this crate, no `From<reqwest::Error>` or `From<std::io::Error>`:
// every variant needs context (url, path) the source errors don't carry.
