//! Inputs for a single guarded fetch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::constants::UNBOUNDED_TIMEOUT;
use super::error::InvalidArgument;

/// Progress callback receiving a completed fraction in `[0.0, 1.0]`.
///
/// The callback may run on any runtime worker thread; it must not assume
/// affinity to the caller's thread.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Everything needed for one call to [`Downloader::download`](super::Downloader::download).
///
/// A request can only be built through [`DownloadRequest::new`], which rejects
/// an empty remote address. Every other failure is reported through the
/// returned [`TransferOutcome`](super::TransferOutcome).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use guarded_fetch::DownloadRequest;
///
/// let request = DownloadRequest::new("https://example.com/file.bin")
///     .unwrap()
///     .with_local_path("/tmp/file.bin")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(request.timeout(), Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct DownloadRequest {
    remote_address: String,
    local_path: Option<PathBuf>,
    timeout: Duration,
    on_progress: Option<ProgressCallback>,
    external_cancel: Option<CancellationToken>,
}

impl DownloadRequest {
    /// Creates a request for `remote_address` with no deadline and a generated
    /// destination.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::EmptyRemoteAddress`] when the address is
    /// empty or whitespace only.
    pub fn new(remote_address: impl Into<String>) -> Result<Self, InvalidArgument> {
        let remote_address = remote_address.into();
        if remote_address.trim().is_empty() {
            return Err(InvalidArgument::EmptyRemoteAddress);
        }
        Ok(Self {
            remote_address,
            local_path: None,
            timeout: UNBOUNDED_TIMEOUT,
            on_progress: None,
            external_cancel: None,
        })
    }

    /// Sets an explicit destination path.
    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Sets the deadline for the whole transfer.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers a progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Attaches a caller-owned cancellation token.
    ///
    /// The fetch observes a child of this token, so the deadline watchdog
    /// never cancels the caller's token itself.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.external_cancel = Some(token);
        self
    }

    #[must_use]
    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        self.local_path.as_deref()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn on_progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_ref()
    }

    #[must_use]
    pub fn external_cancel(&self) -> Option<&CancellationToken> {
        self.external_cancel.as_ref()
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("remote_address", &self.remote_address)
            .field("local_path", &self.local_path)
            .field("timeout", &self.timeout)
            .field("on_progress", &self.on_progress.is_some())
            .field("external_cancel", &self.external_cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_address() {
        assert_eq!(
            DownloadRequest::new("").unwrap_err(),
            InvalidArgument::EmptyRemoteAddress
        );
    }

    #[test]
    fn test_new_rejects_whitespace_address() {
        assert!(DownloadRequest::new("   \t").is_err());
    }

    #[test]
    fn test_defaults() {
        let request = DownloadRequest::new("https://example.com/a.bin").unwrap();
        assert_eq!(request.remote_address(), "https://example.com/a.bin");
        assert!(request.local_path().is_none());
        assert_eq!(request.timeout(), UNBOUNDED_TIMEOUT);
        assert!(request.on_progress().is_none());
        assert!(request.external_cancel().is_none());
    }

    #[test]
    fn test_builder_sets_fields() {
        let token = CancellationToken::new();
        let request = DownloadRequest::new("https://example.com/a.bin")
            .unwrap()
            .with_local_path("/tmp/a.bin")
            .with_timeout(Duration::from_millis(250))
            .with_progress(|_| {})
            .with_cancellation(token);

        assert_eq!(request.local_path(), Some(Path::new("/tmp/a.bin")));
        assert_eq!(request.timeout(), Duration::from_millis(250));
        assert!(request.on_progress().is_some());
        assert!(request.external_cancel().is_some());
    }

    #[test]
    fn test_debug_omits_callback_body() {
        let request = DownloadRequest::new("https://example.com/a.bin")
            .unwrap()
            .with_progress(|_| {});
        let rendered = format!("{request:?}");
        assert!(rendered.contains("on_progress: true"), "got: {rendered}");
    }
}
