use crate::models::RawRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lower bound on the pause between two page requests.
pub const MIN_PAUSE: Duration = Duration::from_millis(300);

/// Search parameters for a multi-page scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Search-result URL of the first page
    pub url: String,
    /// Number of result pages to visit
    pub pages: u32,
    /// Requested pause between pages, in seconds
    pub pause_secs: f64,
    /// Allow falling back to a headless browser
    pub allow_render: bool,
}

impl SearchParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Pause to apply between pages, never shorter than [`MIN_PAUSE`].
    pub fn pause(&self) -> Duration {
        let requested = if self.pause_secs.is_finite() && self.pause_secs > 0.0 {
            Duration::try_from_secs_f64(self.pause_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        requested.max(MIN_PAUSE)
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            url: String::new(),
            pages: 1,
            pause_secs: 2.0,
            allow_render: false,
        }
    }
}

/// Result of running one extraction strategy over a page.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The strategy located its container; the rows may be empty.
    Found(Vec<RawRecord>),
    /// The page does not have the shape this strategy looks for.
    NotFound,
}

impl ExtractionOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_has_a_floor() {
        let mut params = SearchParams::new("https://example.test");
        params.pause_secs = 0.05;
        assert_eq!(params.pause(), MIN_PAUSE);
        params.pause_secs = -1.0;
        assert_eq!(params.pause(), MIN_PAUSE);
        params.pause_secs = 1.5;
        assert_eq!(params.pause(), Duration::from_millis(1500));
    }

    #[test]
    fn huge_pause_saturates() {
        let mut params = SearchParams::new("https://example.test");
        params.pause_secs = 1e30;
        assert_eq!(params.pause(), Duration::MAX);
    }
}
