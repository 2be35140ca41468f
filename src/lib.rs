//! Guarded Fetch Library
//!
//! A single asynchronous file-transfer primitive: fetch a remote resource
//! into local storage, report progress, respect a deadline, honor a
//! caller-issued cancellation token, and turn every way the fetch can end
//! into one inspectable [`TransferOutcome`].
//!
//! # Architecture
//!
//! - [`download`] - pre-flight checks, HTTP transport, deadline watchdog and
//!   outcome mapping
//! - [`config`] - settings shared by every fetch of one [`Downloader`]

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, DownloaderConfig};
pub use download::{
    CancelReason, DownloadRequest, Downloader, HttpClient, InvalidArgument, OutcomeError,
    OutcomeSummary, TransferError, TransferOutcome, Transport, UnexpectedError,
};

/// Fetches `request` with a default [`Downloader`].
///
/// Builds a fresh HTTP client per call; reuse a [`Downloader`] when fetching
/// many resources.
pub async fn download(request: DownloadRequest) -> TransferOutcome {
    Downloader::default().download(request).await
}
