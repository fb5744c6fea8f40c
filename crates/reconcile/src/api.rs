//! The provider capability the reconciler runs against.
//!
//! [`BillingApi`] is the narrow waist between the engine and whatever backs
//! it: the real REST client in the `provider` crate, or an in-memory mock
//! in tests. Any provider with cursor-paginated list plus create/update/
//! delete per entity kind can implement it.

use anyhow::Result;
use catalog::{Coupon, Price, Product, TaxRate};
use std::collections::BTreeMap;

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Whether more pages follow; the cursor is the last item's id.
    pub has_more: bool,
}

/// Flat key/value payload for create and update calls.
///
/// Providers take form-encoded bodies, so nested values flatten into
/// bracketed keys (`metadata[tier]=pro`). Optional fields that are unset
/// are never pushed: the provider rejects explicit nulls, and a coupon must
/// carry exactly one of `amount_off`/`percent_off`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key/value pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.push((key.into(), value.to_string()));
    }

    /// Append a pair only when the value is set.
    pub fn push_opt<T: ToString>(&mut self, key: impl Into<String>, value: Option<&T>) {
        if let Some(value) = value {
            self.push(key, value.to_string());
        }
    }

    /// Append metadata as bracketed keys.
    pub fn push_metadata(&mut self, metadata: &BTreeMap<String, String>) {
        for (key, value) in metadata {
            self.push(format!("metadata[{key}]"), value);
        }
    }

    /// First value for a key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate as borrowed pairs, ready for form encoding.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Remote CRUD surface, one method set per entity kind.
///
/// Create and update calls return the provider's view of the entity so
/// callers can pick up assigned ids. Errors carry no retry semantics here;
/// the engine treats any failure as fatal for the current run.
pub trait BillingApi {
    fn list_products(&self, starting_after: Option<&str>) -> Result<Page<Product>>;
    fn list_prices(&self, starting_after: Option<&str>) -> Result<Page<Price>>;
    fn list_tax_rates(&self, starting_after: Option<&str>) -> Result<Page<TaxRate>>;
    fn list_coupons(&self, starting_after: Option<&str>) -> Result<Page<Coupon>>;

    fn create_product(&self, params: &Params) -> Result<Product>;
    fn update_product(&self, id: &str, params: &Params) -> Result<Product>;

    fn create_price(&self, params: &Params) -> Result<Price>;
    fn update_price(&self, id: &str, params: &Params) -> Result<Price>;

    fn create_tax_rate(&self, params: &Params) -> Result<TaxRate>;
    fn update_tax_rate(&self, id: &str, params: &Params) -> Result<TaxRate>;

    fn create_coupon(&self, params: &Params) -> Result<Coupon>;
    fn update_coupon(&self, id: &str, params: &Params) -> Result<Coupon>;
    fn delete_coupon(&self, id: &str) -> Result<()>;
}
