//! Execute a change set against the provider in dependency order.
//!
//! The order is fixed: products before their prices (a price create needs
//! the product id), creations before updates before removals within a kind,
//! tax rates and coupons last. Calls are strictly sequential. The first
//! failure aborts the remainder with no rollback - partial application is
//! an expected outcome, and re-running recomputes the diff against the
//! now-partially-updated remote state, which makes a retry safe.

use crate::api::{BillingApi, Params};
use crate::changeset::ChangeSet;
use crate::entity::{Entity, field_changes};
use crate::schema::is_mutable;
use anyhow::{Context, Result};
use catalog::{Coupon, Price, Product, TaxRate, geography};
use log::debug;
use serde_json::Value;

/// Apply every planned operation, ticking `progress` once per remote call.
///
/// The tick count matches [`ChangeSet::count_operations`], nested prices
/// included.
pub fn apply<A: BillingApi>(
    changes: &ChangeSet,
    api: &A,
    mut progress: impl FnMut(),
) -> Result<()> {
    for product in &changes.products.new {
        let created = api
            .create_product(&product_create_params(product))
            .with_context(|| format!("failed to create product {:?}", product.name))?;
        progress();
        debug!("created product {:?} as {:?}", product.name, created.id);

        let product_id = created
            .id
            .as_deref()
            .context("provider returned a created product without an id")?;
        for price in &product.prices {
            api.create_price(&price_create_params(price, product_id))
                .with_context(|| format!("failed to create price for product {product_id}"))?;
            progress();
        }
    }

    for update in &changes.products.updated {
        let id = planned_id(&update.local)?;
        api.update_product(id, &update_params(&update.local, &update.remote))
            .with_context(|| format!("failed to update product {id}"))?;
        progress();
    }

    for product in &changes.products.removed {
        let id = planned_id(product)?;
        api.update_product(id, &deactivate_params())
            .with_context(|| format!("failed to deactivate product {id}"))?;
        progress();
    }

    for price in &changes.prices.new {
        let product_id = price
            .product
            .as_deref()
            .context("planned new price is missing its product reference")?;
        api.create_price(&price_create_params(price, product_id))
            .with_context(|| format!("failed to create price for product {product_id}"))?;
        progress();
    }

    for update in &changes.prices.updated {
        let id = planned_id(&update.local)?;
        api.update_price(id, &update_params(&update.local, &update.remote))
            .with_context(|| format!("failed to update price {id}"))?;
        progress();
    }

    for price in &changes.prices.removed {
        let id = planned_id(price)?;
        api.update_price(id, &deactivate_params())
            .with_context(|| format!("failed to deactivate price {id}"))?;
        progress();
    }

    for tax in &changes.taxes.new {
        api.create_tax_rate(&tax_rate_create_params(tax))
            .with_context(|| format!("failed to create tax rate {:?}", tax.display_name))?;
        progress();
    }

    for update in &changes.taxes.updated {
        let id = planned_id(&update.local)?;
        api.update_tax_rate(id, &update_params(&update.local, &update.remote))
            .with_context(|| format!("failed to update tax rate {id}"))?;
        progress();
    }

    for tax in &changes.taxes.removed {
        let id = planned_id(tax)?;
        api.update_tax_rate(id, &deactivate_params())
            .with_context(|| format!("failed to deactivate tax rate {id}"))?;
        progress();
    }

    for coupon in &changes.coupons.new {
        api.create_coupon(&coupon_create_params(coupon))
            .with_context(|| format!("failed to create coupon {:?}", coupon.id))?;
        progress();
    }

    for update in &changes.coupons.updated {
        let id = planned_id(&update.local)?;
        api.update_coupon(id, &update_params(&update.local, &update.remote))
            .with_context(|| format!("failed to update coupon {id}"))?;
        progress();
    }

    for coupon in &changes.coupons.removed {
        let id = planned_id(coupon)?;
        api.delete_coupon(id)
            .with_context(|| format!("failed to delete coupon {id}"))?;
        progress();
    }

    Ok(())
}

fn planned_id<T: Entity>(entity: &T) -> Result<&str> {
    entity
        .id()
        .with_context(|| format!("planned {} operation is missing an id", T::KIND))
}

// ============================================================================
// Payload builders
// ============================================================================

/// Fields for a product create call. Only identifying and mutable-schema
/// fields are sent; unset optionals are stripped entirely.
pub fn product_create_params(product: &Product) -> Params {
    let mut params = Params::new();
    params.push("name", &product.name);
    params.push_opt("description", product.description.as_ref());
    params.push("active", product.active);
    params.push_metadata(&product.metadata);
    params
}

/// Fields for a price create call under the given product id.
pub fn price_create_params(price: &Price, product_id: &str) -> Params {
    let mut params = Params::new();
    params.push("product", product_id);
    params.push("currency", &price.currency);
    params.push("unit_amount", price.unit_amount);
    params.push_opt("nickname", price.nickname.as_ref());
    if let Some(interval) = &price.interval {
        params.push("recurring[interval]", interval);
        params.push_opt("recurring[interval_count]", price.interval_count.as_ref());
    }
    params.push("active", price.active);
    params.push_metadata(&price.metadata);
    params
}

/// Fields for a tax rate create call; the jurisdiction label splits back
/// into country and state codes.
pub fn tax_rate_create_params(tax: &TaxRate) -> Params {
    let (country, state) = geography::parse_jurisdiction(&tax.jurisdiction);
    let mut params = Params::new();
    params.push("display_name", &tax.display_name);
    params.push("percentage", tax.percentage);
    params.push("inclusive", tax.inclusive);
    params.push("country", country);
    params.push_opt("state", state.as_ref());
    params.push_opt("description", tax.description.as_ref());
    params.push("active", tax.active);
    params.push_metadata(&tax.metadata);
    params
}

/// Fields for a coupon create call.
///
/// Exactly one of `amount_off`/`percent_off` is present in the payload;
/// the other key is never sent, not even as null - the provider rejects
/// coupons that carry both keys.
pub fn coupon_create_params(coupon: &Coupon) -> Params {
    let mut params = Params::new();
    params.push_opt("id", coupon.id.as_ref());
    params.push_opt("name", coupon.name.as_ref());
    params.push_opt("amount_off", coupon.amount_off.as_ref());
    params.push_opt("currency", coupon.currency.as_ref());
    params.push_opt("percent_off", coupon.percent_off.as_ref());
    params.push("duration", &coupon.duration);
    params.push_opt("duration_in_months", coupon.duration_in_months.as_ref());
    params.push_metadata(&coupon.metadata);
    params
}

/// The one-field payload that deactivates a product, price or tax rate.
pub fn deactivate_params() -> Params {
    let mut params = Params::new();
    params.push("active", false);
    params
}

/// Fields for an update call: only the mutable fields that actually differ
/// between the local entity and its remote counterpart.
pub fn update_params<T: Entity>(local: &T, remote: &T) -> Params {
    let mut params = Params::new();
    for change in field_changes(local, remote) {
        if is_mutable(T::KIND, &change.field) {
            push_value(&mut params, &change.field, &change.local);
        }
    }
    params
}

/// Flatten a JSON value into form fields; objects become bracketed keys.
fn push_value(params: &mut Params, field: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                push_value(params, &format!("{field}[{key}]"), value);
            }
        }
        Value::String(s) => params.push(field, s),
        other => params.push(field, other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Page;
    use crate::diff::diff;
    use crate::fetch::fetch_all;
    use catalog::Catalog;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    // ------------------------------------------------------------------
    // In-memory provider
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockState {
        products: Vec<Product>,
        prices: Vec<Price>,
        taxes: Vec<TaxRate>,
        coupons: Vec<Coupon>,
        calls: Vec<String>,
        next_id: u32,
    }

    #[derive(Default)]
    struct MockApi {
        state: RefCell<MockState>,
        fail_on: Option<&'static str>,
    }

    impl MockApi {
        fn with_remote(
            products: Vec<Product>,
            prices: Vec<Price>,
            taxes: Vec<TaxRate>,
            coupons: Vec<Coupon>,
        ) -> Self {
            Self {
                state: RefCell::new(MockState {
                    products,
                    prices,
                    taxes,
                    coupons,
                    ..MockState::default()
                }),
                fail_on: None,
            }
        }

        fn record(&self, call: &str) -> Result<()> {
            self.state.borrow_mut().calls.push(call.to_string());
            if self.fail_on == Some(call.split(' ').next().unwrap_or_default()) {
                anyhow::bail!("simulated provider failure on {call}");
            }
            Ok(())
        }

        // Generated ids use a suffix no fixture id carries, so a created
        // entity never collides with a preloaded one.
        fn assign_id(&self, prefix: &str) -> String {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            format!("{}_new_{}", prefix, state.next_id)
        }

        fn calls(&self) -> Vec<String> {
            self.state.borrow().calls.clone()
        }
    }

    fn metadata_from(params: &Params) -> BTreeMap<String, String> {
        params
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix("metadata[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(|key| (key.to_string(), value.to_string()))
            })
            .collect()
    }

    fn single_page<T: Clone>(items: &[T]) -> Result<Page<T>> {
        Ok(Page {
            data: items.to_vec(),
            has_more: false,
        })
    }

    impl BillingApi for MockApi {
        fn list_products(&self, _: Option<&str>) -> Result<Page<Product>> {
            single_page(&self.state.borrow().products)
        }
        fn list_prices(&self, _: Option<&str>) -> Result<Page<Price>> {
            single_page(&self.state.borrow().prices)
        }
        fn list_tax_rates(&self, _: Option<&str>) -> Result<Page<TaxRate>> {
            single_page(&self.state.borrow().taxes)
        }
        fn list_coupons(&self, _: Option<&str>) -> Result<Page<Coupon>> {
            single_page(&self.state.borrow().coupons)
        }

        fn create_product(&self, params: &Params) -> Result<Product> {
            self.record("create_product")?;
            let product = Product {
                id: Some(self.assign_id("prod")),
                name: params.get("name").unwrap_or_default().to_string(),
                description: params.get("description").map(String::from),
                active: params.get("active") != Some("false"),
                metadata: metadata_from(params),
                prices: Vec::new(),
            };
            self.state.borrow_mut().products.push(product.clone());
            Ok(product)
        }

        fn update_product(&self, id: &str, params: &Params) -> Result<Product> {
            self.record(&format!("update_product {id}"))?;
            let mut state = self.state.borrow_mut();
            let product = state
                .products
                .iter_mut()
                .find(|p| p.id.as_deref() == Some(id))
                .context("no such product")?;
            if let Some(name) = params.get("name") {
                product.name = name.to_string();
            }
            if let Some(description) = params.get("description") {
                product.description = Some(description.to_string());
            }
            if let Some(active) = params.get("active") {
                product.active = active != "false";
            }
            if params.iter().any(|(k, _)| k.starts_with("metadata[")) {
                product.metadata = metadata_from(params);
            }
            Ok(product.clone())
        }

        fn create_price(&self, params: &Params) -> Result<Price> {
            self.record("create_price")?;
            let price = Price {
                id: Some(self.assign_id("price")),
                product: params.get("product").map(String::from),
                nickname: params.get("nickname").map(String::from),
                unit_amount: params
                    .get("unit_amount")
                    .unwrap_or("0")
                    .parse()
                    .context("bad unit_amount")?,
                currency: params.get("currency").unwrap_or_default().to_string(),
                interval: params.get("recurring[interval]").map(String::from),
                interval_count: params
                    .get("recurring[interval_count]")
                    .map(str::parse)
                    .transpose()
                    .context("bad interval_count")?,
                active: params.get("active") != Some("false"),
                metadata: metadata_from(params),
            };
            self.state.borrow_mut().prices.push(price.clone());
            Ok(price)
        }

        fn update_price(&self, id: &str, params: &Params) -> Result<Price> {
            self.record(&format!("update_price {id}"))?;
            let mut state = self.state.borrow_mut();
            let price = state
                .prices
                .iter_mut()
                .find(|p| p.id.as_deref() == Some(id))
                .context("no such price")?;
            if let Some(nickname) = params.get("nickname") {
                price.nickname = Some(nickname.to_string());
            }
            if let Some(active) = params.get("active") {
                price.active = active != "false";
            }
            if params.iter().any(|(k, _)| k.starts_with("metadata[")) {
                price.metadata = metadata_from(params);
            }
            Ok(price.clone())
        }

        fn create_tax_rate(&self, params: &Params) -> Result<TaxRate> {
            self.record("create_tax_rate")?;
            let tax = TaxRate {
                id: Some(self.assign_id("txr")),
                display_name: params.get("display_name").unwrap_or_default().to_string(),
                percentage: params
                    .get("percentage")
                    .unwrap_or("0")
                    .parse()
                    .context("bad percentage")?,
                inclusive: params.get("inclusive") == Some("true"),
                jurisdiction: geography::jurisdiction_label(
                    params.get("country").unwrap_or_default(),
                    params.get("state"),
                ),
                description: params.get("description").map(String::from),
                active: params.get("active") != Some("false"),
                metadata: metadata_from(params),
            };
            self.state.borrow_mut().taxes.push(tax.clone());
            Ok(tax)
        }

        fn update_tax_rate(&self, id: &str, params: &Params) -> Result<TaxRate> {
            self.record(&format!("update_tax_rate {id}"))?;
            let mut state = self.state.borrow_mut();
            let tax = state
                .taxes
                .iter_mut()
                .find(|t| t.id.as_deref() == Some(id))
                .context("no such tax rate")?;
            if let Some(display_name) = params.get("display_name") {
                tax.display_name = display_name.to_string();
            }
            if let Some(description) = params.get("description") {
                tax.description = Some(description.to_string());
            }
            if let Some(active) = params.get("active") {
                tax.active = active != "false";
            }
            if params.iter().any(|(k, _)| k.starts_with("metadata[")) {
                tax.metadata = metadata_from(params);
            }
            Ok(tax.clone())
        }

        fn create_coupon(&self, params: &Params) -> Result<Coupon> {
            self.record("create_coupon")?;
            let coupon = Coupon {
                id: Some(
                    params
                        .get("id")
                        .map_or_else(|| self.assign_id("coup"), String::from),
                ),
                name: params.get("name").map(String::from),
                amount_off: params
                    .get("amount_off")
                    .map(str::parse)
                    .transpose()
                    .context("bad amount_off")?,
                currency: params.get("currency").map(String::from),
                percent_off: params
                    .get("percent_off")
                    .map(str::parse)
                    .transpose()
                    .context("bad percent_off")?,
                duration: params.get("duration").unwrap_or_default().to_string(),
                duration_in_months: params
                    .get("duration_in_months")
                    .map(str::parse)
                    .transpose()
                    .context("bad duration_in_months")?,
                metadata: metadata_from(params),
            };
            self.state.borrow_mut().coupons.push(coupon.clone());
            Ok(coupon)
        }

        fn update_coupon(&self, id: &str, params: &Params) -> Result<Coupon> {
            self.record(&format!("update_coupon {id}"))?;
            let mut state = self.state.borrow_mut();
            let coupon = state
                .coupons
                .iter_mut()
                .find(|c| c.id.as_deref() == Some(id))
                .context("no such coupon")?;
            if let Some(name) = params.get("name") {
                coupon.name = Some(name.to_string());
            }
            if params.iter().any(|(k, _)| k.starts_with("metadata[")) {
                coupon.metadata = metadata_from(params);
            }
            Ok(coupon.clone())
        }

        fn delete_coupon(&self, id: &str) -> Result<()> {
            self.record(&format!("delete_coupon {id}"))?;
            self.state
                .borrow_mut()
                .coupons
                .retain(|c| c.id.as_deref() != Some(id));
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn product(id: Option<&str>, name: &str, active: bool) -> Product {
        Product {
            id: id.map(String::from),
            name: name.to_string(),
            description: None,
            active,
            metadata: BTreeMap::new(),
            prices: Vec::new(),
        }
    }

    fn price(id: Option<&str>, product: Option<&str>, nickname: Option<&str>) -> Price {
        Price {
            id: id.map(String::from),
            product: product.map(String::from),
            nickname: nickname.map(String::from),
            unit_amount: 1000,
            currency: "usd".into(),
            interval: Some("month".into()),
            interval_count: Some(1),
            active: true,
            metadata: BTreeMap::new(),
        }
    }

    fn coupon(id: &str, percent_off: f64) -> Coupon {
        Coupon {
            id: Some(id.to_string()),
            name: None,
            amount_off: None,
            currency: None,
            percent_off: Some(percent_off),
            duration: "once".into(),
            duration_in_months: None,
            metadata: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Payload tests
    // ------------------------------------------------------------------

    #[test]
    fn test_coupon_params_carry_exactly_one_discount_key() {
        let percent = coupon("TEN", 10.0);
        let params = coupon_create_params(&percent);
        assert!(params.contains("percent_off"));
        assert!(!params.contains("amount_off"));
        assert!(!params.contains("currency"));

        let amount = Coupon {
            id: Some("FIVE_BUCKS".into()),
            name: None,
            amount_off: Some(500),
            currency: Some("usd".into()),
            percent_off: None,
            duration: "forever".into(),
            duration_in_months: None,
            metadata: BTreeMap::new(),
        };
        let params = coupon_create_params(&amount);
        assert!(params.contains("amount_off"));
        assert!(params.contains("currency"));
        assert!(!params.contains("percent_off"));
    }

    #[test]
    fn test_one_time_price_params_skip_recurring() {
        let mut one_time = price(None, None, None);
        one_time.interval = None;
        one_time.interval_count = None;
        let params = price_create_params(&one_time, "prod_1");
        assert!(!params.contains("recurring[interval]"));
        assert!(!params.contains("recurring[interval_count]"));
        assert_eq!(params.get("product"), Some("prod_1"));
    }

    #[test]
    fn test_update_params_exclude_immutable_fields() {
        let mut local = price(Some("price_1"), Some("prod_1"), Some("Monthly"));
        local.currency = "eur".into();
        let remote = price(Some("price_1"), Some("prod_1"), Some("Old"));

        let params = update_params(&local, &remote);

        assert_eq!(params.get("nickname"), Some("Monthly"));
        assert!(!params.contains("currency"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_update_params_flatten_metadata() {
        let mut local = product(Some("prod_1"), "Pro", true);
        local.metadata.insert("tier".into(), "pro".into());
        let remote = product(Some("prod_1"), "Pro", true);

        let params = update_params(&local, &remote);

        assert_eq!(params.get("metadata[tier]"), Some("pro"));
        assert!(!params.contains("name"));
    }

    #[test]
    fn test_tax_rate_params_split_jurisdiction() {
        let tax = TaxRate {
            id: None,
            display_name: "Sales Tax".into(),
            percentage: 7.25,
            inclusive: false,
            jurisdiction: "CA, US".into(),
            description: None,
            active: true,
            metadata: BTreeMap::new(),
        };
        let params = tax_rate_create_params(&tax);
        assert_eq!(params.get("country"), Some("US"));
        assert_eq!(params.get("state"), Some("CA"));
    }

    // ------------------------------------------------------------------
    // Apply behavior
    // ------------------------------------------------------------------

    /// Local wants: a new product with a nested price, a rename of an
    /// existing product, a new standalone price, a price nickname change,
    /// a deactivation, a new coupon and a coupon deletion.
    fn scenario() -> (Catalog, MockApi) {
        let mut new_product = product(None, "Team", true);
        new_product.prices.push(price(None, None, Some("Monthly")));

        let local = Catalog {
            products: vec![
                new_product,
                product(Some("prod_1"), "Pro (renamed)", true),
                product(Some("prod_2"), "Legacy", false),
            ],
            prices: vec![
                price(None, Some("prod_1"), Some("Yearly")),
                price(Some("price_1"), Some("prod_1"), Some("New nickname")),
            ],
            taxes: vec![],
            coupons: vec![coupon("LAUNCH", 20.0)],
        };

        let api = MockApi::with_remote(
            vec![
                product(Some("prod_1"), "Pro", true),
                product(Some("prod_2"), "Legacy", true),
            ],
            vec![price(Some("price_1"), Some("prod_1"), Some("Old nickname"))],
            vec![],
            vec![coupon("OLD10", 10.0)],
        );
        (local, api)
    }

    #[test]
    fn test_apply_runs_in_dependency_order() {
        let (local, api) = scenario();
        let remote = fetch_all(&api).unwrap();
        let result = diff(&local, &remote);
        let before = api.calls().len();

        apply(&result.changes, &api, || {}).unwrap();

        let calls = &api.calls()[before..];
        assert_eq!(
            calls,
            &[
                "create_product".to_string(),
                "create_price".to_string(), // nested under the new product
                "update_product prod_1".to_string(),
                "update_product prod_2".to_string(), // deactivation
                "create_price".to_string(),          // standalone new price
                "update_price price_1".to_string(),
                "create_coupon".to_string(),
                "delete_coupon OLD10".to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_progress_matches_count() {
        let (local, api) = scenario();
        let remote = fetch_all(&api).unwrap();
        let result = diff(&local, &remote);

        let mut ticks = 0usize;
        apply(&result.changes, &api, || ticks += 1).unwrap();

        assert_eq!(ticks, result.changes.count_operations());
        assert_eq!(ticks, 8);
    }

    #[test]
    fn test_apply_is_idempotent_after_reload() {
        let (local, api) = scenario();
        let remote = fetch_all(&api).unwrap();
        let result = diff(&local, &remote);

        apply(&result.changes, &api, || {}).unwrap();

        // The provider converged on the local intent.
        {
            let state = api.state.borrow();
            assert!(state.products.iter().any(|p| p.name == "Team"));
            let legacy = state
                .products
                .iter()
                .find(|p| p.id.as_deref() == Some("prod_2"))
                .unwrap();
            assert!(!legacy.active);
            assert!(state.coupons.iter().all(|c| c.id.as_deref() != Some("OLD10")));
        }

        // After a sync the local file is overwritten with the fresh remote
        // state; diffing the reloaded pair must yield nothing.
        let fresh = fetch_all(&api).unwrap();
        let reloaded = fresh.clone();
        let again = diff(&reloaded, &fresh);
        assert!(again.changes.is_empty());
        assert!(again.warnings.is_empty());
    }

    #[test]
    fn test_apply_aborts_on_first_failure() {
        let (local, api) = scenario();
        let api = MockApi {
            state: api.state,
            fail_on: Some("update_product"),
        };
        let remote = fetch_all(&api).unwrap();
        let result = diff(&local, &remote);

        let mut ticks = 0usize;
        let err = apply(&result.changes, &api, || ticks += 1).unwrap_err();
        assert!(format!("{err:#}").contains("simulated provider failure"));

        // The new product and its nested price went through before the
        // failing update; nothing after it ran.
        assert_eq!(ticks, 2);
        let calls = api.calls();
        assert!(!calls.iter().any(|c| c.starts_with("create_coupon")));
        assert!(!calls.iter().any(|c| c.starts_with("delete_coupon")));
    }

    #[test]
    fn test_nested_price_uses_assigned_product_id() {
        let mut new_product = product(None, "Team", true);
        new_product.prices.push(price(None, None, None));
        let local = Catalog {
            products: vec![new_product],
            ..Catalog::default()
        };
        let api = MockApi::default();
        let result = diff(&local, &fetch_all(&api).unwrap());

        apply(&result.changes, &api, || {}).unwrap();

        let state = api.state.borrow();
        let created_product = &state.products[0];
        assert_eq!(state.prices[0].product, created_product.id);
    }
}
