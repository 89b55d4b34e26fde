use crate::models::RawRecord;
use crate::scrapers::error::Result;
use crate::scrapers::normalize::UrlScheme;
use crate::scrapers::strategies::{element_text, selector};
use crate::scrapers::text::to_integer_amount;
use crate::scrapers::traits::ExtractionStrategy;
use crate::scrapers::types::ExtractionOutcome;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:m²|m2|sqm)").expect("valid regex"));

/// A count followed by the bedroom word in English, Dutch or French.
static BEDROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:bdr|bed|slpk|slaap|ch\.|chambre)").expect("valid regex")
});

/// "€ 250.000" or "250 000 €". Digit groups need a real separator; a plain
/// space only counts before a trailing `€`, so neighbouring postcodes and
/// areas are never glued onto the amount.
static EURO_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"€\s*(?:\d{1,3}(?:[.,\x{A0}\x{202F}]\d{3})+|\d+)|\b(?:\d{1,3}(?:[.,\x{A0}\x{202F} ]\d{3})+|\d+)\s*€",
    )
    .expect("valid regex")
});

/// Where a portal puts things inside a result card.
#[derive(Debug, Clone)]
pub struct CardLayout {
    /// Container signatures, tried in order; the first one that matches wins
    pub containers: &'static [&'static str],
    pub price: &'static str,
    /// Element holding the "bedrooms + area" line; whole card text when unset
    pub details: Option<&'static str>,
    pub city: &'static str,
    pub link: &'static str,
}

/// Reads listings out of server-rendered result cards.
pub struct CardStrategy {
    name: &'static str,
    layout: CardLayout,
    scheme: UrlScheme,
    link_fallback: Option<Regex>,
}

struct CardSelectors {
    price: Selector,
    details: Option<Selector>,
    city: Selector,
    link: Selector,
}

impl CardStrategy {
    pub fn new(name: &'static str, layout: CardLayout, scheme: UrlScheme) -> Self {
        Self {
            name,
            layout,
            scheme,
            link_fallback: None,
        }
    }

    /// When no container matches, treat every anchor whose `href` matches
    /// `pattern` as a card.
    pub fn with_link_fallback(mut self, pattern: Regex) -> Self {
        self.link_fallback = Some(pattern);
        self
    }

    fn selectors(&self) -> Result<CardSelectors> {
        Ok(CardSelectors {
            price: selector(self.layout.price)?,
            details: self.layout.details.map(selector).transpose()?,
            city: selector(self.layout.city)?,
            link: selector(self.layout.link)?,
        })
    }

    fn read_card(&self, card: ElementRef<'_>, sel: &CardSelectors) -> Option<RawRecord> {
        let card_text = element_text(card);

        let price_text = card
            .select(&sel.price)
            .map(element_text)
            .find(|t| to_integer_amount(t).is_some())
            .or_else(|| EURO_PRICE.find(&card_text).map(|m| m.as_str().to_string()));

        let Some(price_text) = price_text.filter(|t| to_integer_amount(t).unwrap_or(0) > 0) else {
            debug!(strategy = self.name, "Skipping card without a price");
            return None;
        };

        let details = sel
            .details
            .as_ref()
            .and_then(|s| card.select(s).next())
            .map(element_text)
            .unwrap_or_else(|| card_text.clone());

        let mut row = RawRecord::new();
        row.insert("price".into(), Value::String(price_text));

        if let Some(area) = AREA.captures(&details).and_then(|c| c.get(1)) {
            row.insert("surface".into(), Value::String(area.as_str().to_string()));
        }
        if let Some(beds) = BEDROOMS
            .captures(&details)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            row.insert("bedrooms".into(), Value::from(beds));
        }

        if let Some(city) = card
            .select(&sel.city)
            .map(element_text)
            .find(|t| !t.is_empty())
        {
            row.insert("city".into(), Value::String(city));
        }

        let href = card
            .value()
            .attr("href")
            .or_else(|| card.select(&sel.link).find_map(|a| a.value().attr("href")));
        if let Some(link) = href.and_then(|h| self.scheme.resolve(h)) {
            row.insert("link".into(), Value::String(link));
        }

        Some(row)
    }
}

impl ExtractionStrategy for CardStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, markup: &str) -> Result<ExtractionOutcome> {
        let document = Html::parse_document(markup);
        let sel = self.selectors()?;

        for signature in self.layout.containers {
            let container = selector(signature)?;
            let cards: Vec<_> = document.select(&container).collect();
            if cards.is_empty() {
                continue;
            }
            debug!(strategy = self.name, signature = *signature, "Found {} cards", cards.len());
            let rows = cards
                .into_iter()
                .filter_map(|card| self.read_card(card, &sel))
                .collect();
            return Ok(ExtractionOutcome::Found(rows));
        }

        if let Some(pattern) = &self.link_fallback {
            let anchors: Vec<_> = document
                .select(&selector("a[href]")?)
                .filter(|a| a.value().attr("href").is_some_and(|h| pattern.is_match(h)))
                .collect();
            if !anchors.is_empty() {
                debug!(strategy = self.name, "Falling back to {} listing links", anchors.len());
                let rows = anchors
                    .into_iter()
                    .filter_map(|a| self.read_card(a, &sel))
                    .collect();
                return Ok(ExtractionOutcome::Found(rows));
            }
        }

        Ok(ExtractionOutcome::NotFound)
    }
}
