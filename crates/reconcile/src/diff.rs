//! The diff engine: compare local and remote catalogs into a change set.
//!
//! Each entity kind is planned independently. The rules:
//!
//! - New: a local entity with no id - except coupons, where the provider
//!   accepts client-chosen ids, so "new" means the id does not appear in
//!   the remote list at all.
//! - Updated: a local entity whose remote counterpart (matched by exact id)
//!   differs in at least one mutable field. Differences in immutable fields
//!   only warn; the field is dropped from the effective update.
//! - Removed: a remote entity with no active local counterpart. Products,
//!   prices and tax rates get deactivated; coupons get deleted.
//!
//! A local id the remote does not know is drift: the entity was deleted on
//! the provider side outside this tool. That is a warning for the user to
//! resolve, never an error and never an API call.

use crate::changeset::{ChangeSet, KindChanges, Update};
use crate::entity::{Entity, field_changes};
use crate::schema::is_mutable;
use catalog::{Catalog, EntityKind};
use log::debug;
use serde::Serialize;
use std::fmt;

/// Non-fatal findings surfaced to the user during diff computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// A local entity carries an id the remote has never heard of.
    Drift { kind: EntityKind, id: String },
    /// A local change touches a field the provider does not allow mutating.
    ImmutableField {
        kind: EntityKind,
        id: String,
        field: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drift { kind, id } => write!(
                f,
                "{kind} {id} exists locally with an id but not remotely; \
                 it was likely deleted on the provider side"
            ),
            Self::ImmutableField { kind, id, field } => write!(
                f,
                "{kind} {id}: field `{field}` cannot be changed after creation; \
                 the local change will be ignored"
            ),
        }
    }
}

/// Result of a diff: the change set plus the warnings found computing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diff {
    pub changes: ChangeSet,
    pub warnings: Vec<Warning>,
}

/// Compute the change set that would bring `remote` in line with `local`.
///
/// Deterministic: both catalogs are sorted on working copies first, so
/// structurally equal inputs produce byte-identical change sets no matter
/// how the callers ordered their lists.
pub fn diff(local: &Catalog, remote: &Catalog) -> Diff {
    let mut local = local.clone();
    local.sort();
    let mut remote = remote.clone();
    remote.sort();

    let mut warnings = Vec::new();
    let changes = ChangeSet {
        products: plan_kind(&local.products, &remote.products, &mut warnings),
        prices: plan_kind(&local.prices, &remote.prices, &mut warnings),
        taxes: plan_kind(&local.taxes, &remote.taxes, &mut warnings),
        coupons: plan_kind(&local.coupons, &remote.coupons, &mut warnings),
    };

    debug!(
        "diff: {} operations planned ({} warnings)",
        changes.count_operations(),
        warnings.len()
    );
    Diff { changes, warnings }
}

fn plan_kind<T: Entity>(local: &[T], remote: &[T], warnings: &mut Vec<Warning>) -> KindChanges<T> {
    let mut changes = KindChanges::default();

    for entity in local {
        let Some(id) = entity.id() else {
            changes.new.push(entity.clone());
            continue;
        };

        // Ids are expected unique; if the remote ever lists duplicates,
        // the last listed one wins.
        let Some(counterpart) = remote.iter().filter(|r| r.id() == Some(id)).next_back() else {
            if T::KIND == EntityKind::Coupon {
                // Coupons may carry a user-assigned id before creation.
                changes.new.push(entity.clone());
            } else {
                warnings.push(Warning::Drift {
                    kind: T::KIND,
                    id: id.to_string(),
                });
            }
            continue;
        };

        // An inactive local entity is headed for the removal bucket; the
        // deactivation call covers it, so no update is planned on top.
        if !entity.is_active() {
            continue;
        }

        let mut has_mutable_change = false;
        for change in field_changes(entity, counterpart) {
            if is_mutable(T::KIND, &change.field) {
                has_mutable_change = true;
            } else {
                warnings.push(Warning::ImmutableField {
                    kind: T::KIND,
                    id: id.to_string(),
                    field: change.field,
                });
            }
        }
        if has_mutable_change {
            changes.updated.push(Update {
                local: entity.clone(),
                remote: counterpart.clone(),
            });
        }
    }

    for counterpart in remote {
        let Some(id) = counterpart.id() else { continue };
        let local_match = local.iter().filter(|l| l.id() == Some(id)).next_back();
        let keep = local_match.is_some_and(Entity::is_active);
        if !keep {
            changes.removed.push(counterpart.clone());
        }
    }

    changes
}

// ============================================================================
// Tests
// ============================================================================
