//! The computed change set: what `apply` would do, per entity kind.

use catalog::{Coupon, Price, Product, TaxRate};
use serde::Serialize;

/// A planned update: the local entity carrying the desired state, plus the
/// matched remote counterpart so field differences can be recomputed by the
/// applier and the presenter without another fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update<T> {
    pub local: T,
    pub remote: T,
}

/// The three disjoint buckets for one entity kind.
///
/// `removed` means deactivation for products, prices and tax rates, and
/// deletion for coupons (the provider forbids deactivating those).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindChanges<T> {
    pub new: Vec<T>,
    pub updated: Vec<Update<T>>,
    pub removed: Vec<T>,
}

impl<T> Default for KindChanges<T> {
    fn default() -> Self {
        Self {
            new: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> KindChanges<T> {
    /// Number of planned operations for this kind, nested entries excluded.
    pub fn len(&self) -> usize {
        self.new.len() + self.updated.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the apply step would send to the provider. Ephemeral:
/// computed, optionally displayed, optionally applied, then discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub products: KindChanges<Product>,
    pub prices: KindChanges<Price>,
    pub taxes: KindChanges<TaxRate>,
    pub coupons: KindChanges<Coupon>,
}

impl ChangeSet {
    /// Total number of remote calls applying this change set will make.
    ///
    /// Prices nested inside new products count individually: each needs
    /// its own create call once the product id exists. This is the unit
    /// the apply progress bar is sized to.
    pub fn count_operations(&self) -> usize {
        let nested: usize = self.products.new.iter().map(|p| p.prices.len()).sum();
        nested + self.products.len() + self.prices.len() + self.taxes.len() + self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count_operations() == 0
    }
}
