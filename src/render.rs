//! Colorized rendering of a computed change set.

use crate::ui;
use catalog::{Coupon, Price, Product, TaxRate};
use colored::Colorize;
use reconcile::schema::is_mutable;
use reconcile::{ChangeSet, Entity, KindChanges, Warning, field_changes};

/// One-line display label for an entity, used next to the change glyph.
trait Describe {
    fn label(&self) -> String;
}

impl Describe for Product {
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Describe for Price {
    fn label(&self) -> String {
        let amount = format!("{} {}", self.unit_amount, self.currency);
        let base = match &self.nickname {
            Some(nickname) => format!("{nickname} ({amount})"),
            None => amount,
        };
        match &self.interval {
            Some(interval) => format!("{base} / {interval}"),
            None => base,
        }
    }
}

impl Describe for TaxRate {
    fn label(&self) -> String {
        format!(
            "{} {}% ({})",
            self.display_name, self.percentage, self.jurisdiction
        )
    }
}

impl Describe for Coupon {
    fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| "(unnamed)".to_string())
    }
}

/// Print accumulated diff warnings, one line each, before the diff body.
pub fn warnings(warnings: &[Warning]) {
    for warning in warnings {
        ui::warn(&warning.to_string());
    }
}

/// Print the full change set, one section per entity kind with changes.
pub fn changes(changes: &ChangeSet) {
    // Prices nested under a new product print under that product, not in
    // the Prices section.
    render_kind("Products", &changes.products, "deactivate", |product| {
        product.prices.iter().map(Describe::label).collect()
    });
    render_kind("Prices", &changes.prices, "deactivate", no_nested);
    render_kind("Tax rates", &changes.taxes, "deactivate", no_nested);
    render_kind("Coupons", &changes.coupons, "delete", no_nested);
}

fn no_nested<T>(_: &T) -> Vec<String> {
    Vec::new()
}

fn render_kind<T: Entity + Describe>(
    title: &str,
    kind: &KindChanges<T>,
    removal_verb: &str,
    nested: impl Fn(&T) -> Vec<String>,
) {
    if kind.is_empty() {
        return;
    }
    ui::section(title);

    for entity in &kind.new {
        println!("  {} {}", "+".green(), entity.label());
        for line in nested(entity) {
            println!("      {} {}", "+".green(), line);
        }
    }
    for update in &kind.updated {
        println!("  {} {}", "~".yellow(), update.local.label());
        for change in field_changes(&update.local, &update.remote) {
            if !is_mutable(T::KIND, &change.field) {
                continue;
            }
            println!(
                "      {}: {} {} {}",
                change.field.dimmed(),
                change.remote.to_string().red(),
                "→".dimmed(),
                change.local.to_string().green(),
            );
        }
    }
    for entity in &kind.removed {
        println!(
            "  {} {} {}",
            "-".red(),
            entity.label(),
            format!("({removal_verb})").dimmed()
        );
    }
}

/// One-line tally printed after the diff body.
pub fn summary(changes: &ChangeSet) -> String {
    let nested: usize = changes.products.new.iter().map(|p| p.prices.len()).sum();
    let created = nested
        + changes.products.new.len()
        + changes.prices.new.len()
        + changes.taxes.new.len()
        + changes.coupons.new.len();
    let updated = changes.products.updated.len()
        + changes.prices.updated.len()
        + changes.taxes.updated.len()
        + changes.coupons.updated.len();
    let removed = changes.products.removed.len()
        + changes.prices.removed.len()
        + changes.taxes.removed.len()
        + changes.coupons.removed.len();
    format!(
        "{} to create, {} to update, {} to remove ({} API calls)",
        created,
        updated,
        removed,
        changes.count_operations()
    )
}
