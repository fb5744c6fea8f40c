//! Catalog reconciliation: diff, plan, apply.
//!
//! The pipeline is load local + fetch remote (two [`catalog::Catalog`]s),
//! [`diff`] them into a [`ChangeSet`], then [`apply`] that change set
//! against a [`BillingApi`] in dependency order. Everything here is
//! synchronous and sequential: provider rate limits are per-account and a
//! product must exist before its prices can be created, so there is nothing
//! to gain from fan-out.

pub mod api;
pub mod apply;
mod changeset;
pub mod diff;
mod entity;
pub mod fetch;
pub mod schema;

pub use api::{BillingApi, Page, Params};
pub use apply::apply;
pub use changeset::{ChangeSet, KindChanges, Update};
pub use diff::{Diff, Warning, diff};
pub use entity::{Entity, FieldChange, field_changes};
pub use fetch::fetch_all;
