//! Progress bar for a single fetch.

use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Resolution of the bar; fractions are scaled onto `0..=BAR_LENGTH`.
const BAR_LENGTH: u64 = 1000;

/// Creates the progress bar when requested.
///
/// The bar starts as a spinner-style message naming the host and is filled by
/// [`set_fraction`] once the server reports a size.
pub(crate) fn progress_bar(enabled: bool, url: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let host = Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(std::string::ToString::to_string))
        .unwrap_or_else(|| "remote".to_string());

    let bar = ProgressBar::new(BAR_LENGTH);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {percent:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_message(format!("Downloading from {host}"));
    Some(bar)
}

/// Moves `bar` to `fraction` of its length.
pub(crate) fn set_fraction(bar: &ProgressBar, fraction: f64) {
    bar.set_position(fraction_to_position(fraction));
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn fraction_to_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_disabled_returns_none() {
        assert!(progress_bar(false, "https://example.com/f.bin").is_none());
    }

    #[test]
    fn test_progress_bar_enabled_names_host() {
        let bar = progress_bar(true, "https://example.com/f.bin").unwrap();
        assert_eq!(bar.length(), Some(BAR_LENGTH));
        assert!(bar.message().contains("example.com"));
    }

    #[test]
    fn test_set_fraction_scales_and_clamps() {
        assert_eq!(fraction_to_position(0.0), 0);
        assert_eq!(fraction_to_position(0.5), 500);
        assert_eq!(fraction_to_position(1.0), BAR_LENGTH);
        assert_eq!(fraction_to_position(1.5), BAR_LENGTH);

        let bar = ProgressBar::hidden();
        bar.set_length(BAR_LENGTH);
        set_fraction(&bar, 0.25);
        assert_eq!(bar.position(), 250);
    }
}
