use crate::models::Source;
use crate::scrapers::normalize::UrlScheme;
use crate::scrapers::strategies::{CardLayout, CardStrategy, GlobalArrayStrategy, ScriptPayloadStrategy};
use crate::scrapers::traits::{ExtractionStrategy, SiteScraper};

pub const BASE_URL: &str = "https://www.immoweb.be";

const SCHEME: UrlScheme = UrlScheme {
    base: BASE_URL,
    detail_template: Some("https://www.immoweb.be/en/classified/{id}"),
};

const CARDS: CardLayout = CardLayout {
    containers: &[
        "article.card--result",
        "div.card--result",
        "div.search-results__item",
        "li.search-results__item",
    ],
    price: "[class*=\"price\"]",
    details: Some("[class*=\"information--property\"], [class*=\"property-info\"]"),
    city: "[class*=\"locality\"], [class*=\"location\"], [class*=\"address\"]",
    link: "a[href]",
};

/// Immoweb search results.
///
/// The portal has shipped server-rendered cards, a Next.js payload, a Redux
/// state blob and a bare `window.classifieds` array over time; all four are
/// tried in that order.
pub struct ImmowebScraper {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ImmowebScraper {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(CardStrategy::new("immoweb-cards", CARDS, SCHEME)),
                Box::new(ScriptPayloadStrategy::next_data()),
                Box::new(ScriptPayloadStrategy::initial_state()),
                Box::new(GlobalArrayStrategy::window_classifieds()),
            ],
        }
    }
}

impl Default for ImmowebScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteScraper for ImmowebScraper {
    fn source(&self) -> Source {
        Source::Immoweb
    }

    fn url_scheme(&self) -> UrlScheme {
        SCHEME
    }

    fn strategies(&self) -> &[Box<dyn ExtractionStrategy>] {
        &self.strategies
    }
}
