#[cfg(feature = "browser")]
pub mod browser;
pub mod dedup;
pub mod error;
pub mod fetch;
pub mod immoweb;
pub mod normalize;
pub mod pagination;
pub mod strategies;
pub mod text;
pub mod traits;
pub mod types;
pub mod zimmo;

#[cfg(feature = "browser")]
pub use browser::ChromeRenderer;
pub use error::ScrapeError;
pub use fetch::{HttpFetcher, PageFetcher, Renderer};
pub use immoweb::ImmowebScraper;
pub use pagination::{scrape, ScrapeReport, StopReason};
pub use traits::{ExtractionStrategy, SiteScraper};
pub use types::{ExtractionOutcome, SearchParams};
pub use zimmo::ZimmoScraper;

use crate::models::Source;

/// Scraper for a supported portal
pub fn site_for(source: Source) -> Box<dyn SiteScraper> {
    match source {
        Source::Immoweb => Box::new(ImmowebScraper::new()),
        Source::Zimmo => Box::new(ZimmoScraper::new()),
    }
}
