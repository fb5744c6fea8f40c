//! Provider API response shapes.
//!
//! The provider's JSON does not match the catalog model one to one: prices
//! nest their recurrence under a `recurring` object, and tax rates carry
//! separate `country`/`state` fields where the catalog keeps one
//! jurisdiction label. These types mirror the wire format exactly and
//! convert into the catalog model with `From`.

use catalog::{Coupon, Price, Product, TaxRate, geography};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One page of a listing response.
#[derive(Debug, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<ApiProduct> for Product {
    fn from(p: ApiProduct) -> Self {
        Self {
            id: Some(p.id),
            name: p.name,
            description: p.description,
            active: p.active,
            metadata: p.metadata,
            prices: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiPrice {
    pub id: String,
    pub product: String,
    pub nickname: Option<String>,
    // Null for metered prices, which this tool does not manage but may
    // still encounter in a listing.
    #[serde(default)]
    pub unit_amount: Option<i64>,
    pub currency: String,
    pub recurring: Option<Recurring>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct Recurring {
    pub interval: String,
    pub interval_count: Option<u32>,
}

impl From<ApiPrice> for Price {
    fn from(p: ApiPrice) -> Self {
        let (interval, interval_count) = match p.recurring {
            Some(r) => (Some(r.interval), r.interval_count),
            None => (None, None),
        };
        Self {
            id: Some(p.id),
            product: Some(p.product),
            nickname: p.nickname,
            unit_amount: p.unit_amount.unwrap_or_default(),
            currency: p.currency,
            interval,
            interval_count,
            active: p.active,
            metadata: p.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiTaxRate {
    pub id: String,
    pub display_name: String,
    pub percentage: f64,
    pub inclusive: bool,
    pub country: Option<String>,
    pub state: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<ApiTaxRate> for TaxRate {
    fn from(t: ApiTaxRate) -> Self {
        Self {
            id: Some(t.id),
            display_name: t.display_name,
            percentage: t.percentage,
            inclusive: t.inclusive,
            jurisdiction: geography::jurisdiction_label(
                t.country.as_deref().unwrap_or_default(),
                t.state.as_deref(),
            ),
            description: t.description,
            active: t.active,
            metadata: t.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiCoupon {
    pub id: String,
    pub name: Option<String>,
    pub amount_off: Option<i64>,
    pub currency: Option<String>,
    pub percent_off: Option<f64>,
    pub duration: String,
    pub duration_in_months: Option<u32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl From<ApiCoupon> for Coupon {
    fn from(c: ApiCoupon) -> Self {
        Self {
            id: Some(c.id),
            name: c.name,
            amount_off: c.amount_off,
            currency: c.currency,
            percent_off: c.percent_off,
            duration: c.duration,
            duration_in_months: c.duration_in_months,
            metadata: c.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_listing_deserializes() {
        let body = r#"{
            "data": [
                {
                    "id": "prod_123",
                    "object": "product",
                    "name": "Pro Plan",
                    "description": null,
                    "active": true,
                    "metadata": {"tier": "pro"}
                }
            ],
            "has_more": false
        }"#;

        let list: List<ApiProduct> = serde_json::from_str(body).unwrap();
        assert!(!list.has_more);

        let product: Product = list.data.into_iter().next().unwrap().into();
        assert_eq!(product.id.as_deref(), Some("prod_123"));
        assert_eq!(product.name, "Pro Plan");
        assert_eq!(product.metadata.get("tier").map(String::as_str), Some("pro"));
        assert!(product.prices.is_empty());
    }

    #[test]
    fn test_recurring_price_flattens() {
        let body = r#"{
            "id": "price_123",
            "product": "prod_123",
            "nickname": "Monthly",
            "unit_amount": 1500,
            "currency": "usd",
            "recurring": {"interval": "month", "interval_count": 1},
            "active": true
        }"#;

        let price: Price = serde_json::from_str::<ApiPrice>(body).unwrap().into();
        assert_eq!(price.interval.as_deref(), Some("month"));
        assert_eq!(price.interval_count, Some(1));
        assert_eq!(price.unit_amount, 1500);
        assert_eq!(price.product.as_deref(), Some("prod_123"));
    }

    #[test]
    fn test_one_time_price_has_no_interval() {
        let body = r#"{
            "id": "price_456",
            "product": "prod_123",
            "nickname": null,
            "unit_amount": 9900,
            "currency": "usd",
            "recurring": null,
            "active": true
        }"#;

        let price: Price = serde_json::from_str::<ApiPrice>(body).unwrap().into();
        assert_eq!(price.interval, None);
        assert_eq!(price.interval_count, None);
    }

    #[test]
    fn test_tax_rate_builds_jurisdiction_label() {
        let body = r#"{
            "id": "txr_123",
            "display_name": "Sales Tax",
            "percentage": 7.25,
            "inclusive": false,
            "country": "US",
            "state": "CA",
            "description": null,
            "active": true
        }"#;

        let tax: TaxRate = serde_json::from_str::<ApiTaxRate>(body).unwrap().into();
        assert_eq!(tax.jurisdiction, "CA, US");

        let country_only = r#"{
            "id": "txr_456",
            "display_name": "VAT",
            "percentage": 19.0,
            "inclusive": true,
            "country": "DE",
            "state": null,
            "description": null,
            "active": true
        }"#;

        let tax: TaxRate = serde_json::from_str::<ApiTaxRate>(country_only)
            .unwrap()
            .into();
        assert_eq!(tax.jurisdiction, "DE");
    }

    #[test]
    fn test_coupon_deserializes() {
        let body = r#"{
            "id": "LAUNCH20",
            "name": "Launch discount",
            "amount_off": null,
            "currency": null,
            "percent_off": 20.0,
            "duration": "repeating",
            "duration_in_months": 3
        }"#;

        let coupon: Coupon = serde_json::from_str::<ApiCoupon>(body).unwrap().into();
        assert_eq!(coupon.id.as_deref(), Some("LAUNCH20"));
        assert_eq!(coupon.percent_off, Some(20.0));
        assert_eq!(coupon.amount_off, None);
        assert_eq!(coupon.duration_in_months, Some(3));
        assert!(coupon.metadata.is_empty());
    }
}
