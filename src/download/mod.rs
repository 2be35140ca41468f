//! Guarded single-file HTTP fetch.
//!
//! This module fetches one remote resource into a local file while racing
//! three ways a fetch can end: natural completion, a caller deadline, and a
//! caller-owned cancellation token.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Idempotent short-circuit when the destination is already populated
//! - Generated collision-free destinations when no path is given
//! - Deadline watchdog with scoped disposal
//! - Monotonic progress fractions, never emitted for unknown sizes
//! - One uniform [`TransferOutcome`] for every exit path
//!
//! # Example
//!
//! ```no_run
//! use guarded_fetch::download::{DownloadRequest, Downloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let outcome = Downloader::default()
//!     .download(DownloadRequest::new("https://example.com/paper.pdf")?)
//!     .await;
//! if let Some(path) = outcome.local_path() {
//!     println!("Downloaded: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod outcome;
pub mod preflight;
pub mod progress;
mod request;
pub mod watchdog;

pub use client::{HttpClient, TransferStatus, Transport};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, UNBOUNDED_TIMEOUT};
pub use engine::Downloader;
pub use error::{InvalidArgument, TransferError, UnexpectedError};
pub use outcome::{CancelReason, OutcomeError, OutcomeSummary, TransferOutcome};
pub use progress::ProgressReporter;
pub use request::{DownloadRequest, ProgressCallback};
pub use watchdog::{DeadlineWatchdog, WatchdogGuard};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, TransferError>` explicitly in function signatures.
