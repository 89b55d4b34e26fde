use thiserror::Error;

/// Errors raised while fetching or reading listing pages.
///
/// None of these escape a multi-page scrape: the pagination driver logs them
/// and returns whatever it accumulated so far.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport-level failure (DNS, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    /// Enhanced rendering was requested but no renderer is available.
    #[error("enhanced rendering unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The headless browser failed to load or capture the page.
    #[error("browser rendering failed: {0}")]
    Render(String),

    /// An embedded JSON payload was located but could not be parsed.
    #[error("malformed {strategy} payload: {source}")]
    Payload {
        strategy: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid selector {0}")]
    Selector(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
