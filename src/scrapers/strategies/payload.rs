//! Strategies reading listings from JSON embedded in the page.

use crate::models::RawRecord;
use crate::scrapers::error::{Result, ScrapeError};
use crate::scrapers::strategies::selector;
use crate::scrapers::traits::ExtractionStrategy;
use crate::scrapers::types::ExtractionOutcome;
use regex::Regex;
use scraper::Html;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Keys under which portals have been seen to nest their listing arrays.
pub const LISTING_KEYS: &[&str] = &["classifieds", "items", "results", "list", "properties"];

static INITIAL_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"window\.__INITIAL_STATE__\s*=\s*").expect("valid regex"));

static CLASSIFIEDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"window\.classifieds\s*=\s*").expect("valid regex"));

#[derive(Debug, Clone)]
enum Locator {
    /// Text content of the first element matching a CSS selector
    Element(&'static str),
    /// JSON value right after a JavaScript assignment
    Assignment(Regex),
}

impl Locator {
    /// Locate the payload and parse it. `Ok(None)` when the page has no such payload.
    fn read(&self, strategy: &'static str, markup: &str) -> Result<Option<Value>> {
        let payload_error = |source| ScrapeError::Payload { strategy, source };
        match self {
            Locator::Element(css) => {
                let document = Html::parse_document(markup);
                let Some(script) = document.select(&selector(css)?).next() else {
                    return Ok(None);
                };
                let text: String = script.text().collect();
                serde_json::from_str(text.trim()).map(Some).map_err(payload_error)
            }
            Locator::Assignment(pattern) => {
                // Guards like `if (window.x === undefined)` and `= null` resets
                // match too; the first hit holding a real value is the assignment.
                // The value is parsed in place, so the `;` and whatever follows
                // are left unread.
                let mut last_error = None;
                for found in pattern.find_iter(markup) {
                    let tail = &markup[found.end()..];
                    match serde_json::Deserializer::from_str(tail)
                        .into_iter::<Value>()
                        .next()
                        .transpose()
                    {
                        Ok(Some(Value::Null)) | Ok(None) => {}
                        Ok(Some(value)) => return Ok(Some(value)),
                        Err(e) => last_error = Some(e),
                    }
                }
                last_error.map_or(Ok(None), |e| Err(payload_error(e)))
            }
        }
    }
}

/// Collect every listing-like array found anywhere in `root`.
///
/// An array qualifies when it sits under one of [`LISTING_KEYS`], is not
/// empty and starts with an object. The walk keeps going after a match, so
/// listings nested under several keys are all returned. It uses an explicit
/// stack, so deeply nested payloads cannot exhaust the call stack.
pub fn collect_listing_rows(root: &Value) -> Vec<RawRecord> {
    let mut found = Vec::new();
    let mut pending = vec![root];

    while let Some(node) = pending.pop() {
        match node {
            Value::Object(map) => {
                for key in LISTING_KEYS {
                    if let Some(Value::Array(items)) = map.get(*key) {
                        if items.first().is_some_and(Value::is_object) {
                            found.extend(items.iter().filter_map(Value::as_object).cloned());
                        }
                    }
                }
                pending.extend(map.values().rev());
            }
            Value::Array(items) => pending.extend(items.iter().rev()),
            _ => {}
        }
    }

    found
}

/// Searches a framework state blob for nested listing arrays.
pub struct ScriptPayloadStrategy {
    name: &'static str,
    locator: Locator,
}

impl ScriptPayloadStrategy {
    /// Next.js `<script id="__NEXT_DATA__">` payload
    pub fn next_data() -> Self {
        Self {
            name: "next-data",
            locator: Locator::Element("script#__NEXT_DATA__"),
        }
    }

    /// Redux-style `window.__INITIAL_STATE__ = {...};` assignment
    pub fn initial_state() -> Self {
        Self {
            name: "initial-state",
            locator: Locator::Assignment(INITIAL_STATE.clone()),
        }
    }
}

impl ExtractionStrategy for ScriptPayloadStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, markup: &str) -> Result<ExtractionOutcome> {
        let Some(payload) = self.locator.read(self.name, markup)? else {
            return Ok(ExtractionOutcome::NotFound);
        };

        let rows = collect_listing_rows(&payload);
        debug!(strategy = self.name, "Payload holds {} listing rows", rows.len());
        if rows.is_empty() {
            Ok(ExtractionOutcome::NotFound)
        } else {
            Ok(ExtractionOutcome::Found(rows))
        }
    }
}

/// Reads a JSON array assigned straight to a global, e.g. `window.classifieds = [...]`.
pub struct GlobalArrayStrategy {
    name: &'static str,
    locator: Locator,
}

impl GlobalArrayStrategy {
    pub fn window_classifieds() -> Self {
        Self {
            name: "window-classifieds",
            locator: Locator::Assignment(CLASSIFIEDS.clone()),
        }
    }
}

impl ExtractionStrategy for GlobalArrayStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&self, markup: &str) -> Result<ExtractionOutcome> {
        match self.locator.read(self.name, markup)? {
            Some(Value::Array(items)) => Ok(ExtractionOutcome::Found(
                items.into_iter().filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            )),
            Some(_) => {
                debug!(strategy = self.name, "Assignment is not an array");
                Ok(ExtractionOutcome::NotFound)
            }
            None => Ok(ExtractionOutcome::NotFound),
        }
    }
}
