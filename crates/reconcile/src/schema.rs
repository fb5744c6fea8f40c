//! Static mutability schema.
//!
//! The provider freezes most fields at creation time; only the fields
//! listed here may change on an existing remote entity. This table is the
//! single source of truth the diff engine consults - mutability is never
//! inferred from the data.

use catalog::EntityKind;

const PRODUCT_MUTABLE: &[&str] = &["name", "description", "active", "metadata"];
const PRICE_MUTABLE: &[&str] = &["nickname", "active", "metadata"];
const TAX_RATE_MUTABLE: &[&str] = &["display_name", "description", "active", "metadata"];
const COUPON_MUTABLE: &[&str] = &["name", "metadata"];

/// Fields the provider allows changing after creation, per kind.
pub fn mutable_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Product => PRODUCT_MUTABLE,
        EntityKind::Price => PRICE_MUTABLE,
        EntityKind::TaxRate => TAX_RATE_MUTABLE,
        EntityKind::Coupon => COUPON_MUTABLE,
    }
}

/// Whether a single field is mutable for the given kind.
pub fn is_mutable(kind: EntityKind, field: &str) -> bool {
    mutable_fields(kind).contains(&field)
}
