use serde::{Deserialize, Serialize};

/// Source of the property listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Immoweb,
    Zimmo,
}

impl Source {
    pub fn name(&self) -> &'static str {
        match self {
            Source::Immoweb => "immoweb",
            Source::Zimmo => "zimmo",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unstructured key-value bag produced by an extraction strategy.
///
/// Its shape depends on the strategy and on the portal's current page
/// layout; only the item normalizer interprets it.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Site-independent listing shape consumed by the evaluator.
///
/// `price` is always positive; every other field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub price: f64,
    pub area_m2: Option<f64>,
    pub bedrooms: Option<u32>,
    pub city: Option<String>,
    pub url: Option<String>,
}

impl ListingRecord {
    /// Price per square meter, when the floor area is known.
    pub fn price_per_m2(&self) -> Option<f64> {
        self.area_m2.filter(|a| *a > 0.0).map(|a| self.price / a)
    }

    /// Case-insensitive substring match on the city; an empty needle matches everything.
    pub fn city_matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.city
            .as_deref()
            .map(|c| c.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}
