//! Buy-to-let screening of Belgian property listings.
//!
//! Listings come from Immoweb or Zimmo search pages (see [`scrapers`]) or
//! from a CSV file (see [`table`]); [`evaluate`] turns them into yields and
//! cash-flow figures and ranks them.

pub mod evaluate;
pub mod logging;
pub mod models;
pub mod scrapers;
pub mod table;

pub use evaluate::{evaluate, rank, Assumptions, EvaluatedListing};
pub use models::{ListingRecord, RawRecord, Source};
