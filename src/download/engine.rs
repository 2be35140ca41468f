//! Guarded fetch orchestration.
//!
//! [`Downloader::download`] runs one fetch through four stages:
//!
//! 1. Pre-flight: resolve the destination, short-circuit if it is already
//!    populated, create the parent directory.
//! 2. Transfer: stream the resource through a [`Transport`] in its own task.
//! 3. Deadline: a [`DeadlineWatchdog`] races the transfer and cancels it when
//!    the request's timeout elapses.
//! 4. Outcome: the terminal state is logged and collapsed into a
//!    [`TransferOutcome`].
//!
//! # Cancellation Model
//!
//! The transfer observes a single token. When the caller supplies a token,
//! the transfer token is its child, so caller cancellation propagates down
//! while the watchdog cancels only the child. Whichever source fires first
//! decides between [`CancelReason::Deadline`](super::CancelReason::Deadline)
//! and [`CancelReason::External`](super::CancelReason::External). A transfer
//! that already completed stays completed regardless of later signals.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use guarded_fetch::{DownloadRequest, Downloader, DownloaderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(&DownloaderConfig::default())?;
//! let request = DownloadRequest::new("https://example.com/file.bin")?
//!     .with_timeout(Duration::from_secs(30))
//!     .with_progress(|fraction| println!("{:.0}%", fraction * 100.0));
//! let outcome = downloader.download(request).await;
//! match outcome.local_path() {
//!     Some(path) => println!("saved to {}", path.display()),
//!     None => println!("failed: {:?}", outcome.error()),
//! }
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::client::{HttpClient, Transport, TransferStatus};
use super::error::UnexpectedError;
use super::outcome::{TerminalState, TransferOutcome, finalize};
use super::preflight::{self, Preflight};
use super::progress::ProgressReporter;
use super::request::DownloadRequest;
use super::watchdog::DeadlineWatchdog;
use crate::config::{ConfigError, DownloaderConfig};

/// Runs guarded fetches.
///
/// Cheap to clone; clones share the underlying transport and its connection
/// pool. Calls are independent and may run concurrently.
#[derive(Clone)]
pub struct Downloader {
    transport: Arc<dyn Transport>,
    temp_dir: Option<PathBuf>,
    progress_interval: Duration,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("temp_dir", &self.temp_dir)
            .field("progress_interval", &self.progress_interval)
            .finish_non_exhaustive()
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::with_transport(Arc::new(HttpClient::new()), &DownloaderConfig::default())
    }
}

impl Downloader {
    /// Creates a downloader backed by an [`HttpClient`] built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is out of range or the HTTP client
    /// cannot be built.
    pub fn new(config: &DownloaderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = HttpClient::with_timeouts(config.connect_timeout_secs, config.read_timeout_secs)
            .map_err(ConfigError::Client)?;
        Ok(Self::with_transport(Arc::new(client), config))
    }

    /// Creates a downloader over a custom transport.
    ///
    /// Transport-level settings in `config` (HTTP timeouts) are ignored.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, config: &DownloaderConfig) -> Self {
        Self {
            transport,
            temp_dir: config.temp_dir.clone(),
            progress_interval: config.progress_interval(),
        }
    }

    /// Fetches `request.remote_address()` into local storage.
    ///
    /// Never fails: every exit path, including a panicking transfer, is
    /// reported through the returned [`TransferOutcome`]. Dropping the
    /// returned future cancels the in-flight transfer.
    #[instrument(skip(self, request), fields(url = %request.remote_address()))]
    pub async fn download(&self, request: DownloadRequest) -> TransferOutcome {
        let started = Instant::now();
        let remote_address = request.remote_address().to_string();

        let state = self.run(&request).await;

        finalize(remote_address, state, started.elapsed())
    }

    async fn run(&self, request: &DownloadRequest) -> TerminalState {
        let preflight =
            match preflight::check(request.local_path(), self.temp_dir.as_deref()).await {
                Ok(preflight) => preflight,
                Err(error) => return TerminalState::UnexpectedFaulted(error),
            };
        let path = match preflight {
            Preflight::ShortCircuit(path) => return TerminalState::ShortCircuitSuccess(path),
            Preflight::Proceed(path) => path,
        };
        let generated = request.local_path().is_none();

        let state = self.transfer(request, path.clone()).await;

        if generated && !matches!(state, TerminalState::Completed(_)) {
            discard_destination(&path).await;
        }
        state
    }

    async fn transfer(&self, request: &DownloadRequest, path: PathBuf) -> TerminalState {
        let url = request.remote_address().to_string();
        let transfer_token = request
            .external_cancel()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        // Cancels the spawned transfer if this future is dropped mid-flight.
        let _cancel_on_drop = transfer_token.clone().drop_guard();

        let watchdog = DeadlineWatchdog::arm(request.timeout(), transfer_token.clone(), &url);

        let transport = Arc::clone(&self.transport);
        let mut progress =
            ProgressReporter::new(request.on_progress().cloned(), self.progress_interval);
        let task_path = path.clone();
        let task_token = transfer_token.clone();
        let handle = tokio::spawn(async move {
            transport
                .fetch_to_file(&url, &task_path, &mut progress, &task_token)
                .await
        });

        let joined = handle.await;
        watchdog.mark_finished();
        let deadline_fired = watchdog.disarm();

        match joined {
            Ok(Ok(TransferStatus::Completed { bytes })) => {
                debug!(bytes, "transfer finished");
                TerminalState::Completed(path)
            }
            Ok(Ok(TransferStatus::Cancelled)) if deadline_fired => TerminalState::TimedOut,
            Ok(Ok(TransferStatus::Cancelled)) => TerminalState::ExternallyCancelled,
            Ok(Err(error)) => TerminalState::TransferFaulted(error),
            Err(join_error) => {
                discard_destination(&path).await;
                TerminalState::UnexpectedFaulted(UnexpectedError::task_failed(describe_join_error(
                    join_error,
                )))
            }
        }
    }
}

/// Removes a destination that will not be handed back to the caller.
async fn discard_destination(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed unused destination"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove unused destination"),
    }
}

fn describe_join_error(join_error: JoinError) -> String {
    if join_error.is_cancelled() {
        return "transfer task was aborted".to_string();
    }
    match join_error.try_into_panic() {
        Ok(payload) => format!("transfer task panicked: {}", panic_message(payload.as_ref())),
        Err(other) => other.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
