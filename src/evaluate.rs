//! Buy-to-let metrics for canonical listings.

use crate::models::ListingRecord;
use serde::{Deserialize, Serialize};

/// Investor assumptions applied to every listing.
///
/// Rates are fractions (0.036 = 3.6 %), amounts are in the listing currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub rent_per_m2: f64,
    /// Monthly rent used when the area is unknown
    pub fallback_rent: f64,
    pub min_rent: Option<f64>,
    pub max_rent: Option<f64>,
    /// Loan-to-value ratio
    pub ltv: f64,
    pub mortgage_rate: f64,
    pub mortgage_years: u32,
    pub registration_rate: f64,
    pub notary_rate: f64,
    pub renovation_buffer: f64,
    pub vacancy_rate: f64,
    pub maintenance_rate: f64,
    pub management_rate: f64,
    pub property_tax_monthly: f64,
    pub insurance_monthly: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            rent_per_m2: 10.0,
            fallback_rent: 1000.0,
            min_rent: None,
            max_rent: None,
            ltv: 0.8,
            mortgage_rate: 0.036,
            mortgage_years: 25,
            registration_rate: 0.10,
            notary_rate: 0.03,
            renovation_buffer: 10_000.0,
            vacancy_rate: 0.05,
            maintenance_rate: 0.05,
            management_rate: 0.0,
            property_tax_monthly: 75.0,
            insurance_monthly: 25.0,
        }
    }
}

/// A listing with its financial evaluation, flattened for CSV export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluatedListing {
    pub price: f64,
    pub area_m2: Option<f64>,
    pub bedrooms: Option<u32>,
    pub city: Option<String>,
    pub url: Option<String>,
    pub purchase_price: f64,
    pub purchase_total: f64,
    pub equity_needed: f64,
    pub est_rent_month: f64,
    #[serde(rename = "monthly_PI")]
    pub monthly_pi: f64,
    pub monthly_costs: f64,
    pub monthly_net_cashflow: f64,
    pub annual_net_cashflow: f64,
    pub gross_yield: f64,
    pub net_yield_on_price: f64,
    pub net_yield_on_equity: f64,
    pub ppsqm: Option<f64>,
    pub rank_score: f64,
}

/// Monthly principal + interest of a fixed-rate annuity loan.
pub fn annuity_payment(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let n = f64::from(years) * 12.0;
    if n == 0.0 {
        return principal;
    }
    if annual_rate <= 0.0 {
        return principal / n;
    }
    let r = annual_rate / 12.0;
    let growth = (1.0 + r).powf(n);
    principal * (r * growth) / (growth - 1.0)
}

/// Monthly rent estimate: area times rent per m², or the fallback, clamped to the bounds.
pub fn estimate_rent(listing: &ListingRecord, a: &Assumptions) -> f64 {
    let rent = match listing.area_m2 {
        Some(area) if area > 0.0 && a.rent_per_m2 > 0.0 => a.rent_per_m2 * area,
        _ => a.fallback_rent,
    };

    let rent = match a.min_rent {
        Some(min) if min > 0.0 && rent < min => min,
        _ => rent,
    };
    match a.max_rent {
        Some(max) if max > 0.0 && rent > max => max,
        _ => rent,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn evaluate(listing: &ListingRecord, a: &Assumptions) -> EvaluatedListing {
    let price = listing.price;
    let rent = estimate_rent(listing, a);

    let purchase_total =
        price + price * a.registration_rate + price * a.notary_rate + a.renovation_buffer;

    let loan = price * a.ltv;
    let equity = purchase_total - loan;
    let monthly_pi = annuity_payment(loan, a.mortgage_rate, a.mortgage_years);

    let monthly_costs = monthly_pi
        + rent * a.vacancy_rate
        + rent * a.maintenance_rate
        + rent * a.management_rate
        + a.property_tax_monthly
        + a.insurance_monthly;
    let monthly_net = rent - monthly_costs;
    let annual_net = monthly_net * 12.0;

    let gross_yield = ratio(rent * 12.0, price);
    let net_yield_on_equity = ratio(annual_net, equity);

    EvaluatedListing {
        price,
        area_m2: listing.area_m2,
        bedrooms: listing.bedrooms,
        city: listing.city.clone(),
        url: listing.url.clone(),
        purchase_price: price,
        purchase_total,
        equity_needed: equity,
        est_rent_month: rent,
        monthly_pi,
        monthly_costs,
        monthly_net_cashflow: monthly_net,
        annual_net_cashflow: annual_net,
        gross_yield,
        net_yield_on_price: ratio(annual_net, price),
        net_yield_on_equity,
        ppsqm: listing.price_per_m2(),
        rank_score: gross_yield * 0.4 + net_yield_on_equity * 0.4 + monthly_net / 1000.0 * 0.2,
    }
}

/// Evaluate every listing and order them best first.
pub fn rank(listings: &[ListingRecord], a: &Assumptions) -> Vec<EvaluatedListing> {
    let mut evaluated: Vec<_> = listings.iter().map(|l| evaluate(l, a)).collect();
    evaluated.sort_by(|x, y| y.rank_score.total_cmp(&x.rank_score));
    evaluated
}
