//! Mapping of raw strategy output onto [`ListingRecord`].

use crate::models::{ListingRecord, RawRecord};
use crate::scrapers::text::{squash_whitespace, to_decimal_measurement, to_integer_amount};
use serde_json::Value;
use tracing::debug;
use url::Url;

const AREA_KEYS: &[&str] = &[
    "netHabitableSurface",
    "netHabitable",
    "livingArea",
    "surface",
    "area_m2",
];
const BEDROOM_KEYS: &[&str] = &["bedroomCount", "bedrooms"];
const LOCALITY_KEYS: &[&str] = &["locality", "localityName"];

/// How a portal spells its listing URLs.
#[derive(Debug, Clone, Copy)]
pub struct UrlScheme {
    /// Origin relative links are resolved against, e.g. `https://www.immoweb.be`
    pub base: &'static str,
    /// Detail-page template with an `{id}` placeholder
    pub detail_template: Option<&'static str>,
}

impl UrlScheme {
    /// Resolve `href` against the portal origin. Absolute links pass through.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let base = Url::parse(self.base).ok()?;
        base.join(href).ok().map(String::from)
    }

    pub fn detail_url(&self, id: &str) -> Option<String> {
        self.detail_template.map(|t| t.replace("{id}", id))
    }
}

/// Map one raw record to the canonical shape.
///
/// Returns `None` when no positive price can be resolved.
pub fn normalize_item(raw: &RawRecord, scheme: &UrlScheme) -> Option<ListingRecord> {
    let price = match resolve_price(raw) {
        Some(p) if p > 0 => p as f64,
        _ => {
            debug!("Dropping record without a usable price");
            return None;
        }
    };

    let property = ["property", "realEstate"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_object))
        .unwrap_or(raw);

    let area_m2 = first_of(property, AREA_KEYS)
        .or_else(|| first_of(raw, AREA_KEYS))
        .and_then(as_measurement)
        .filter(|a| *a > 0.0);

    let bedrooms = first_of(property, BEDROOM_KEYS)
        .or_else(|| first_of(raw, BEDROOM_KEYS))
        .and_then(as_amount)
        .and_then(|b| u32::try_from(b).ok());

    Some(ListingRecord {
        price,
        area_m2,
        bedrooms,
        city: resolve_city(raw, property),
        url: resolve_url(raw, scheme),
    })
}

fn resolve_price(raw: &RawRecord) -> Option<i64> {
    let nested = raw.get("price").and_then(Value::as_object);
    let candidates = [
        nested.and_then(|p| p.get("mainValue")),
        raw.get("priceValue"),
        nested.and_then(|p| p.get("value")),
        raw.get("price").filter(|v| !v.is_object()),
    ];
    candidates.into_iter().flatten().find_map(as_amount)
}

fn resolve_city(raw: &RawRecord, property: &RawRecord) -> Option<String> {
    let location = property
        .get("location")
        .or_else(|| raw.get("location"))
        .and_then(Value::as_object);

    if let Some(loc) = location {
        let locality = first_of(loc, LOCALITY_KEYS).and_then(as_text);
        let postal = loc.get("postalCode").and_then(as_text);
        let city = match (postal, locality) {
            (Some(p), Some(l)) => Some(format!("{p} {l}")),
            (p, l) => l.or(p),
        };
        if city.is_some() {
            return city;
        }
    }

    raw.get("city").and_then(as_text)
}

fn resolve_url(raw: &RawRecord, scheme: &UrlScheme) -> Option<String> {
    if let Some(href) = ["link", "url"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_str))
    {
        if let Some(url) = scheme.resolve(href) {
            return Some(url);
        }
    }

    ["id", "classifiedId"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(as_text))
        .and_then(|id| scheme.detail_url(&id))
}

fn first_of<'a>(map: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}

fn as_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => to_integer_amount(s),
        _ => None,
    }
}

fn as_measurement(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => to_decimal_measurement(s),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => squash_whitespace(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEME: UrlScheme = UrlScheme {
        base: "https://www.immoweb.be",
        detail_template: Some("https://www.immoweb.be/en/classified/{id}"),
    };

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn normalizes_nested_payload_item() {
        let item = raw(json!({
            "id": 42,
            "price": { "mainValue": "300000" },
            "property": {
                "netHabitableSurface": 80,
                "bedroomCount": 2,
                "location": { "postalCode": "1000", "locality": "Brussels" }
            }
        }));

        let record = normalize_item(&item, &SCHEME).unwrap();
        assert_eq!(
            record,
            ListingRecord {
                price: 300_000.0,
                area_m2: Some(80.0),
                bedrooms: Some(2),
                city: Some("1000 Brussels".into()),
                url: Some("https://www.immoweb.be/en/classified/42".into()),
            }
        );
    }

    #[test]
    fn falls_back_to_flat_price_value_and_real_estate() {
        let item = raw(json!({
            "classifiedId": "777",
            "priceValue": 189000,
            "realEstate": { "livingArea": "64,5", "bedrooms": "1" }
        }));

        let record = normalize_item(&item, &SCHEME).unwrap();
        assert_eq!(record.price, 189_000.0);
        assert_eq!(record.area_m2, Some(64.5));
        assert_eq!(record.bedrooms, Some(1));
        assert_eq!(record.city, None);
        assert_eq!(
            record.url.as_deref(),
            Some("https://www.immoweb.be/en/classified/777")
        );
    }

    #[test]
    fn card_record_keeps_link_and_city_text() {
        let item = raw(json!({
            "price": "€ 250.000",
            "surface": "120",
            "bedrooms": 3,
            "city": "5100 JAMBES",
            "link": "/en/classified/house/for-sale/jambes/5100/11111"
        }));

        let record = normalize_item(&item, &SCHEME).unwrap();
        assert_eq!(record.price, 250_000.0);
        assert_eq!(record.area_m2, Some(120.0));
        assert_eq!(record.city.as_deref(), Some("5100 JAMBES"));
        assert_eq!(
            record.url.as_deref(),
            Some("https://www.immoweb.be/en/classified/house/for-sale/jambes/5100/11111")
        );
    }

    #[test]
    fn locality_without_postal_code() {
        let item = raw(json!({
            "price": { "value": 99000 },
            "property": { "location": { "localityName": "Namur" } }
        }));
        let record = normalize_item(&item, &SCHEME).unwrap();
        assert_eq!(record.city.as_deref(), Some("Namur"));
    }

    #[test]
    fn drops_zero_or_missing_price() {
        let zero = raw(json!({ "price": { "mainValue": 0 }, "id": 1 }));
        let missing = raw(json!({ "property": { "bedroomCount": 2 }, "id": 2 }));
        let text = raw(json!({ "price": "Price on request" }));

        assert!(normalize_item(&zero, &SCHEME).is_none());
        assert!(normalize_item(&missing, &SCHEME).is_none());
        assert!(normalize_item(&text, &SCHEME).is_none());
    }

    #[test]
    fn non_positive_area_is_absent() {
        let item = raw(json!({ "price": 150000, "surface": 0 }));
        let record = normalize_item(&item, &SCHEME).unwrap();
        assert_eq!(record.area_m2, None);
        assert_eq!(record.url, None);
    }
}
