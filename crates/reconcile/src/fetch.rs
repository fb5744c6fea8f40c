//! Fetch the full remote catalog through paginated listing.

use crate::api::{BillingApi, Page};
use crate::entity::Entity;
use anyhow::{Context, Result, bail};
use catalog::Catalog;
use log::debug;

/// Pull every entity of every kind from the provider into one [`Catalog`].
///
/// Pages are walked sequentially: each cursor is the previous page's last
/// id, so there is nothing to parallelize. Inactive products, prices and
/// tax rates are dropped (the local file only describes the live catalog);
/// coupons have no active flag and are all kept. An empty remote catalog is
/// a valid result. Any listing failure propagates unretried - re-running
/// the command is the retry mechanism.
pub fn fetch_all(api: &impl BillingApi) -> Result<Catalog> {
    let mut catalog = Catalog {
        products: fetch_kind(|cursor| api.list_products(cursor))
            .context("failed to list products")?,
        prices: fetch_kind(|cursor| api.list_prices(cursor)).context("failed to list prices")?,
        taxes: fetch_kind(|cursor| api.list_tax_rates(cursor))
            .context("failed to list tax rates")?,
        coupons: fetch_kind(|cursor| api.list_coupons(cursor)).context("failed to list coupons")?,
    };

    catalog.products.retain(Entity::is_active);
    catalog.prices.retain(Entity::is_active);
    catalog.taxes.retain(Entity::is_active);
    catalog.sort();

    debug!(
        "fetched remote catalog: {} products, {} prices, {} tax rates, {} coupons",
        catalog.products.len(),
        catalog.prices.len(),
        catalog.taxes.len(),
        catalog.coupons.len()
    );
    Ok(catalog)
}

fn fetch_kind<T, F>(list: F) -> Result<Vec<T>>
where
    T: Entity,
    F: Fn(Option<&str>) -> Result<Page<T>>,
{
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = list(cursor.as_deref())?;
        pages += 1;
        let has_more = page.has_more;
        all.extend(page.data);

        if !has_more {
            break;
        }
        match all.last().and_then(Entity::id) {
            Some(last_id) => cursor = Some(last_id.to_string()),
            // A page with more to come must end in an identified entity;
            // anything else would loop forever on the same cursor.
            None => bail!("provider reported more pages but returned no cursor id"),
        }
    }

    debug!("listed {} {}s over {} pages", all.len(), T::KIND, pages);
    Ok(all)
}
