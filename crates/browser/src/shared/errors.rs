use chromiumoxide::error::CdpError;
use pricewatch_core::{ScrapeError, ScrapeErrorKind};

/// Maps a CDP failure during `action` to a per-identifier error. A CDP
/// request timeout becomes `on_timeout`, which the caller picks for the
/// phase it is in; anything else is `Unknown`.
pub fn to_scrape_error(e: CdpError, action: &str, on_timeout: ScrapeErrorKind) -> ScrapeError {
    match e {
        CdpError::Timeout => ScrapeError::new(on_timeout, format!("{} timed out: {}", action, e)),
        other => ScrapeError::unknown(format!("{} failed: {}", action, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_takes_the_callers_kind() {
        let err = to_scrape_error(CdpError::Timeout, "WaitForSelector", ScrapeErrorKind::SelectorTimeout);
        assert_eq!(err.kind, ScrapeErrorKind::SelectorTimeout);
        assert!(err.message.starts_with("WaitForSelector timed out"));

        let err = to_scrape_error(CdpError::Timeout, "NewPage", ScrapeErrorKind::Unknown);
        assert_eq!(err.kind, ScrapeErrorKind::Unknown);
    }

    #[test]
    fn other_failures_are_unknown_whatever_the_text() {
        let err = to_scrape_error(
            CdpError::msg("navigation timeout while waiting"),
            "Navigation",
            ScrapeErrorKind::NavigationTimeout,
        );
        assert_eq!(err.kind, ScrapeErrorKind::Unknown);
        assert!(err.message.starts_with("Navigation failed: "));
    }
}
