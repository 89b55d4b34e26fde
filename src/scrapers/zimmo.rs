use crate::models::Source;
use crate::scrapers::normalize::UrlScheme;
use crate::scrapers::strategies::{CardLayout, CardStrategy};
use crate::scrapers::traits::{ExtractionStrategy, SiteScraper};
use regex::Regex;
use std::sync::LazyLock;

pub const BASE_URL: &str = "https://www.zimmo.be";

const SCHEME: UrlScheme = UrlScheme {
    base: BASE_URL,
    detail_template: None,
};

const CARDS: CardLayout = CardLayout {
    containers: &["article.property-item", "div.property-item"],
    price: "[class*=\"price\"]",
    details: None,
    city: "[class*=\"location\"], [class*=\"city\"], [class*=\"address\"]",
    link: "a[href]",
};

/// Detail pages live under a language prefix, e.g. `/nl/gent-9000/te-koop/appartement/K1AB2/`.
static LISTING_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://(?:www\.)?zimmo\.be)?/(?:nl|fr|en)/[^/?#]+/[^/?#]+/[^/?#]+")
        .expect("valid regex")
});

/// Zimmo search results: server-rendered cards, or bare listing links when
/// the card markup is missing.
pub struct ZimmoScraper {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ZimmoScraper {
    pub fn new() -> Self {
        let cards = CardStrategy::new("zimmo-cards", CARDS, SCHEME)
            .with_link_fallback(LISTING_LINK.clone());
        Self {
            strategies: vec![Box::new(cards)],
        }
    }
}

impl Default for ZimmoScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteScraper for ZimmoScraper {
    fn source(&self) -> Source {
        Source::Zimmo
    }

    fn url_scheme(&self) -> UrlScheme {
        SCHEME
    }

    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>] {
        &self.strategies
    }
}
