//! CSV input of listings and CSV output of evaluations.

use crate::evaluate::EvaluatedListing;
use crate::models::ListingRecord;
use crate::scrapers::error::Result;
use serde::Deserialize;
use std::io;
use tracing::warn;

/// One input row; columns may be missing or empty.
#[derive(Debug, Deserialize)]
struct ListingRow {
    price: Option<f64>,
    area_m2: Option<f64>,
    bedrooms: Option<f64>,
    city: Option<String>,
    url: Option<String>,
}

impl ListingRow {
    fn into_record(self) -> Option<ListingRecord> {
        let price = self.price.filter(|p| p.is_finite() && *p > 0.0)?;
        Some(ListingRecord {
            price,
            area_m2: self.area_m2.filter(|a| a.is_finite() && *a > 0.0),
            bedrooms: self
                .bedrooms
                .filter(|b| b.is_finite() && *b >= 0.0)
                .map(|b| b.round() as u32),
            city: self.city.filter(|c| !c.trim().is_empty()),
            url: self.url.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Read listings from CSV with a `price,area_m2,bedrooms,city,url` header.
///
/// Rows that fail to parse or carry no positive price are skipped with a warning.
pub fn read_listings<R: io::Read>(reader: R) -> Result<Vec<ListingRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut listings = Vec::new();
    for (idx, row) in rdr.deserialize::<ListingRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        match row {
            Ok(row) => match row.into_record() {
                Some(record) => listings.push(record),
                None => warn!("Skipping CSV line {}: no positive price", line),
            },
            Err(e) => warn!("Skipping CSV line {}: {}", line, e),
        }
    }
    Ok(listings)
}

/// Write evaluated listings as CSV, one row per listing in the given order.
pub fn write_evaluated<W: io::Write>(writer: W, rows: &[EvaluatedListing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
