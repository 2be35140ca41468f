//! HTTP transport for streaming a single remote resource to disk.
//!
//! [`Transport`] is the seam between the fetch orchestration and the network.
//! [`HttpClient`] is the production implementation over `reqwest`; tests
//! substitute their own implementations to drive races deterministically.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransferError;
use super::progress::ProgressReporter;
use crate::user_agent;

/// How a transfer ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// All bytes were written and flushed.
    Completed {
        /// Bytes written to the destination.
        bytes: u64,
    },
    /// The cancellation token fired before the transfer finished.
    Cancelled,
}

/// Byte-stream fetch-to-file with progress and cooperative cancellation.
///
/// Implementations must observe `cancel` at every suspension point and return
/// [`TransferStatus::Cancelled`] promptly once it fires. A failed or cancelled
/// transfer must not leave a partial file at `path`.
///
/// The deadline is enforced only through `cancel`: a transport that ignores
/// the token runs to its own end, and a transfer that returns
/// [`TransferStatus::Completed`] is reported as completed even when the
/// deadline elapsed meanwhile. How soon a timed-out fetch returns is bounded
/// by how quickly the transport reacts to `cancel`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Streams `url` into `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] for invalid URLs, network failures,
    /// non-success HTTP statuses, and IO errors on the destination.
    async fn fetch_to_file(
        &self,
        url: &str,
        path: &Path,
        progress: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<TransferStatus, TransferError>;
}

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between reads
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// The read timeout bounds the gap between successive reads, not the whole
    /// transfer; the caller's deadline bounds the whole transfer.
    ///
    /// # Errors
    ///
    /// Returns the `reqwest` builder error if the TLS backend cannot be
    /// initialised.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }

    async fn send_request(&self, url: Url) -> Result<reqwest::Response, TransferError> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::network(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::http_status(url_str, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpClient {
    #[instrument(skip(self, progress, cancel), fields(url = %url, path = %path.display()))]
    async fn fetch_to_file(
        &self,
        url: &str,
        path: &Path,
        progress: &mut ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<TransferStatus, TransferError> {
        debug!("starting transfer");

        let parsed_url = Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("cancelled before response headers arrived");
                return Ok(TransferStatus::Cancelled);
            }
            result = self.send_request(parsed_url) => result?,
        };

        let total = response.content_length();
        let file = File::create(path)
            .await
            .map_err(|e| TransferError::io(path, e))?;

        let streamed = stream_to_file(file, response, url, path, total, progress, cancel).await;

        match &streamed {
            Ok(TransferStatus::Completed { bytes }) => {
                info!(bytes = *bytes, "transfer complete");
            }
            Ok(TransferStatus::Cancelled) | Err(_) => {
                debug!("cleaning up partial file");
                let _ = tokio::fs::remove_file(path).await;
            }
        }

        streamed
    }
}

/// Streams response body to file, returning bytes written.
///
/// The file handle is owned here and released on every exit path.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    total: Option<u64>,
    progress: &mut ProgressReporter,
    cancel: &CancellationToken,
) -> Result<TransferStatus, TransferError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(bytes = bytes_written, "cancelled mid-stream");
                return Ok(TransferStatus::Cancelled);
            }
            next = stream.next() => next,
        };

        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| TransferError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
        progress.report(bytes_written, total);
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::io(file_path, e))?;

    Ok(TransferStatus::Completed {
        bytes: bytes_written,
    })
}
