//! Uniform view over the four entity kinds.
//!
//! The diff engine and the pagination loop only need identity, the active
//! flag and a JSON projection; this trait gives them that without a match
//! per kind at every call site.

use catalog::{Coupon, EntityKind, Price, Product, TaxRate};
use serde::Serialize;
use serde_json::Value;

/// Common surface of Product/Price/TaxRate/Coupon.
pub trait Entity: Serialize + Clone {
    const KIND: EntityKind;

    /// Remote identifier, if the entity has ever been created remotely
    /// (or, for coupons, was assigned one locally).
    fn id(&self) -> Option<&str>;

    /// Presence flag. Coupons have no such flag on the provider side and
    /// always report `true`.
    fn is_active(&self) -> bool;
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for Price {
    const KIND: EntityKind = EntityKind::Price;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for TaxRate {
    const KIND: EntityKind = EntityKind::TaxRate;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Entity for Coupon {
    const KIND: EntityKind = EntityKind::Coupon;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn is_active(&self) -> bool {
        true
    }
}

/// One field whose local value differs from the remote one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub local: Value,
    pub remote: Value,
}

/// Fields present on the local entity whose value differs structurally
/// from the remote entity's value for the same key.
///
/// Keys the local side does not carry are not compared: the local format
/// does not track every remote field, and an untracked field must never
/// look like a pending change. Comparison goes through `serde_json::Value`,
/// so it is deep and order-independent for maps.
pub fn field_changes<T: Entity>(local: &T, remote: &T) -> Vec<FieldChange> {
    let (Ok(Value::Object(local)), Ok(Value::Object(remote))) =
        (serde_json::to_value(local), serde_json::to_value(remote))
    else {
        return Vec::new();
    };

    local
        .into_iter()
        .filter(|(key, value)| remote.get(key) != Some(value))
        .map(|(key, value)| FieldChange {
            remote: remote.get(&key).cloned().unwrap_or(Value::Null),
            field: key,
            local: value,
        })
        .collect()
}
