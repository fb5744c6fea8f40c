//! Entity types shared by the local file and the provider projection.
//!
//! Serialization matters here beyond the obvious: the reconcile crate
//! compares entities field-by-field through their JSON form, so optional
//! fields use `skip_serializing_if` (an unset field is "not tracked
//! locally", not "tracked as null") and metadata is a `BTreeMap` so the
//! comparison is order-independent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four entity kinds managed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Price,
    TaxRate,
    Coupon,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Price => write!(f, "price"),
            Self::TaxRate => write!(f, "tax rate"),
            Self::Coupon => write!(f, "coupon"),
        }
    }
}

/// A sellable product.
///
/// `prices` is only populated for locally-new products (no `id` yet): their
/// prices cannot live in the flat `Catalog::prices` list because there is no
/// product id to reference until the product is created remotely. The field
/// is excluded from serialization so it never takes part in field
/// comparison or wire payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip)]
    pub prices: Vec<Price>,
}

/// A price attached to a product.
///
/// `product` holds the owning product's remote id. It is `None` exactly
/// while the price rides nested under a locally-new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub unit_amount: i64,
    pub currency: String,
    /// Billing interval for recurring prices (`month`, `year`, ...).
    /// One-time prices have neither interval nor interval_count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_count: Option<u32>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A tax rate, identified on the local side by a jurisdiction label such as
/// `"US"` or `"CA, US"` (see [`crate::geography`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub display_name: String,
    pub percentage: f64,
    pub inclusive: bool,
    pub jurisdiction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A discount coupon.
///
/// Coupons are the odd kind out twice over: the provider lets the user pick
/// the id before creation, and it forbids deactivating them (they are
/// deleted instead), so there is no `active` flag. Exactly one of
/// `amount_off` (with `currency`) and `percent_off` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_off: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_off: Option<f64>,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_months: Option<u32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// The full set of entities from one source, local file or provider.
///
/// Produced fresh on every command invocation; never cached across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub prices: Vec<Price>,
    pub taxes: Vec<TaxRate>,
    pub coupons: Vec<Coupon>,
}

impl Catalog {
    /// Sort every list by id (entities without an id first, then by a
    /// stable per-kind secondary key) so two structurally equal catalogs
    /// compare and serialize identically regardless of input order.
    pub fn sort(&mut self) {
        self.products
            .sort_by(|a, b| (&a.id, &a.name).cmp(&(&b.id, &b.name)));
        self.prices.sort_by(|a, b| {
            (&a.id, &a.product, a.unit_amount).cmp(&(&b.id, &b.product, b.unit_amount))
        });
        self.taxes.sort_by(|a, b| {
            (&a.id, &a.jurisdiction, &a.display_name).cmp(&(&b.id, &b.jurisdiction, &b.display_name))
        });
        self.coupons
            .sort_by(|a, b| (&a.id, &a.name).cmp(&(&b.id, &b.name)));
    }

    /// Total number of entities across all kinds, nested prices included.
    pub fn len(&self) -> usize {
        let nested: usize = self.products.iter().map(|p| p.prices.len()).sum();
        self.products.len() + self.prices.len() + self.taxes.len() + self.coupons.len() + nested
    }

    /// Check if the catalog holds no entities at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
