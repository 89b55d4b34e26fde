//! Extraction strategies shared by the portal scrapers.

pub mod card;
pub mod payload;

pub use card::{CardLayout, CardStrategy};
pub use payload::{collect_listing_rows, GlobalArrayStrategy, ScriptPayloadStrategy};

use crate::scrapers::error::{Result, ScrapeError};
use scraper::{ElementRef, Selector};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{css:?}: {e:?}")))
}

/// Visible text of an element, whitespace-normalized.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    crate::scrapers::text::squash_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}
