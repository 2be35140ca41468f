//! Uniform result of a guarded fetch.
//!
//! Every exit path of [`Downloader::download`](super::Downloader::download)
//! collapses into a [`TransferOutcome`]: either a local path or an
//! [`OutcomeError`], never both. Callers pattern-match on the error kind
//! instead of inspecting error chains.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use super::error::{TransferError, UnexpectedError};

/// Which cancellation source won the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The deadline watchdog fired first.
    Deadline,
    /// The caller's cancellation token fired first.
    External,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deadline => f.write_str("deadline"),
            Self::External => f.write_str("caller"),
        }
    }
}

/// Why a fetch did not produce a file.
#[derive(Debug, Error)]
pub enum OutcomeError {
    /// The transfer was cancelled before it finished.
    #[error("download cancelled by {0}")]
    Cancelled(CancelReason),

    /// Transport or protocol failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Anything outside the transport.
    #[error(transparent)]
    Unexpected(#[from] UnexpectedError),
}

impl OutcomeError {
    /// Stable machine-readable label for this error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cancelled(_) => "cancelled",
            Self::Transfer(_) => "transfer_error",
            Self::Unexpected(_) => "unexpected_error",
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Result of one guarded fetch.
#[derive(Debug)]
pub struct TransferOutcome {
    remote_address: String,
    result: Result<PathBuf, OutcomeError>,
    short_circuited: bool,
    elapsed: Duration,
}

impl TransferOutcome {
    /// The remote address the fetch was asked for.
    #[must_use]
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    /// The local file, present only on success.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        self.result.as_deref().ok()
    }

    /// The failure, absent on success.
    #[must_use]
    pub fn error(&self) -> Option<&OutcomeError> {
        self.result.as_ref().err()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// True when an existing non-empty file satisfied the fetch without network access.
    #[must_use]
    pub fn short_circuited(&self) -> bool {
        self.short_circuited
    }

    /// Wall-clock time of the whole call.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Converts into a plain `Result`.
    ///
    /// # Errors
    ///
    /// Returns the [`OutcomeError`] for any non-success outcome.
    pub fn into_result(self) -> Result<PathBuf, OutcomeError> {
        self.result
    }

    /// Serializable view for reporting.
    #[must_use]
    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            remote_address: self.remote_address.clone(),
            local_path: self.local_path().map(Path::to_path_buf),
            status: self.error().map_or("success", OutcomeError::kind),
            cancel_reason: self.error().and_then(OutcomeError::cancel_reason),
            message: self.error().map(ToString::to_string),
            short_circuited: self.short_circuited,
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Machine-readable summary of a [`TransferOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeSummary {
    pub remote_address: String,
    pub local_path: Option<PathBuf>,
    /// `success`, `cancelled`, `transfer_error` or `unexpected_error`.
    pub status: &'static str,
    pub cancel_reason: Option<CancelReason>,
    pub message: Option<String>,
    pub short_circuited: bool,
    pub elapsed_ms: u64,
}

/// Where one fetch ended up before finalisation.
#[derive(Debug)]
pub(crate) enum TerminalState {
    ShortCircuitSuccess(PathBuf),
    Completed(PathBuf),
    TimedOut,
    ExternallyCancelled,
    TransferFaulted(TransferError),
    UnexpectedFaulted(UnexpectedError),
}

impl TerminalState {
    fn label(&self) -> &'static str {
        match self {
            Self::ShortCircuitSuccess(_) => "short_circuit",
            Self::Completed(_) => "completed",
            Self::TimedOut => "timed_out",
            Self::ExternallyCancelled => "externally_cancelled",
            Self::TransferFaulted(_) => "transfer_faulted",
            Self::UnexpectedFaulted(_) => "unexpected_faulted",
        }
    }
}

/// Logs the terminal state at its severity and builds the outcome.
pub(crate) fn finalize(
    remote_address: String,
    state: TerminalState,
    elapsed: Duration,
) -> TransferOutcome {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let terminal = state.label();

    let (result, short_circuited) = match state {
        TerminalState::ShortCircuitSuccess(path) => {
            info!(url = %remote_address, path = %path.display(), "destination already present; skipped transfer");
            (Ok(path), true)
        }
        TerminalState::Completed(path) => {
            info!(url = %remote_address, path = %path.display(), elapsed_ms, "download succeeded");
            (Ok(path), false)
        }
        TerminalState::TimedOut => {
            debug!(url = %remote_address, elapsed_ms, "download cancelled by deadline");
            (Err(OutcomeError::Cancelled(CancelReason::Deadline)), false)
        }
        TerminalState::ExternallyCancelled => {
            info!(url = %remote_address, elapsed_ms, "download cancelled by caller");
            (Err(OutcomeError::Cancelled(CancelReason::External)), false)
        }
        TerminalState::TransferFaulted(cause) => {
            error!(url = %remote_address, error = %cause, "download failed");
            (Err(OutcomeError::Transfer(cause)), false)
        }
        TerminalState::UnexpectedFaulted(cause) => {
            error!(url = %remote_address, error = %cause, "download failed unexpectedly");
            (Err(OutcomeError::Unexpected(cause)), false)
        }
    };

    debug!(url = %remote_address, terminal, elapsed_ms, "fetch finalized");

    TransferOutcome {
        remote_address,
        result,
        short_circuited,
        elapsed,
    }
}
