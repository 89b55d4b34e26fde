use crate::models::ListingRecord;
use std::collections::HashSet;

/// Identity of a listing across result pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ListingKey {
    Url(String),
    /// Price and area are compared by bit pattern.
    Composite(u64, Option<u64>, Option<String>),
}

impl ListingKey {
    fn of(record: &ListingRecord) -> Self {
        match &record.url {
            Some(url) => ListingKey::Url(url.clone()),
            None => ListingKey::Composite(
                record.price.to_bits(),
                record.area_m2.map(f64::to_bits),
                record.city.clone(),
            ),
        }
    }
}

/// Drop repeated listings, keeping the first occurrence and its position.
pub fn dedupe(records: Vec<ListingRecord>) -> Vec<ListingRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(ListingKey::of(r)))
        .collect()
}
