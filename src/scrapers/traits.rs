use crate::models::{ListingRecord, RawRecord, Source};
use crate::scrapers::error::Result;
use crate::scrapers::normalize::{normalize_item, UrlScheme};
use crate::scrapers::types::ExtractionOutcome;

/// One page-shape-specific way of finding listing rows in markup.
///
/// `Err` means the strategy found its payload but could not parse it; the
/// pagination driver logs that and moves on to the next strategy.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, markup: &str) -> Result<ExtractionOutcome>;
}

/// Common trait for all listing portals.
/// Adding a portal means one more implementation; the driver stays unchanged.
pub trait SiteScraper: Send + Sync {
    fn source(&self) -> Source;

    /// Origin used to resolve relative links and detail-page URLs
    fn url_scheme(&self) -> UrlScheme;

    /// Strategies in priority order
    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>];

    fn normalize(&self, raw: &RawRecord) -> Option<ListingRecord> {
        normalize_item(raw, &self.url_scheme())
    }
}
