//! Billing catalog model and local store.
//!
//! A [`Catalog`] holds the four entity kinds the billing provider knows
//! about: products, prices, tax rates and coupons. Catalogs come from two
//! places that share this one shape:
//!
//! - the local file ([`store::load`] / [`store::save`]), which nests prices
//!   under products and buckets tax rates by country/state, and
//! - the provider's API, projected down to the same flat lists.
//!
//! Keeping both sides in one shape is what makes the reconcile crate's diff
//! a plain structural comparison.

mod error;
pub mod geography;
mod model;
pub mod store;

pub use error::{Error, Result};
pub use model::{Catalog, Coupon, EntityKind, Price, Product, TaxRate};
