//! Local catalog file: load, save and the nest/flatten transforms.
//!
//! On disk the catalog is a single JSON document with three sections:
//! products (each with its prices nested), taxes (bucketed by country code,
//! optionally by state code), and a flat coupon list. In memory everything
//! is flat (see [`Catalog`]); this module owns the two-way transform.
//!
//! Overwriting this file with a freshly fetched remote catalog, via
//! [`save`], is how newly assigned remote ids make it back into source
//! control after a sync.

use crate::error::{Error, Result};
use crate::geography;
use crate::model::{Catalog, Coupon, Price, Product, TaxRate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

// ============================================================================
// File schema
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<ProductEntry>,
    #[serde(default)]
    taxes: BTreeMap<String, CountryTaxes>,
    #[serde(default)]
    coupons: Vec<Coupon>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProductEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    prices: Vec<PriceEntry>,
}

/// A price as written in the file: nested under its product, so it carries
/// no product reference of its own.
#[derive(Debug, Serialize, Deserialize)]
struct PriceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    unit_amount: i64,
    currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interval_count: Option<u32>,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

/// Tax rates for one country: either a flat list (country-level rates) or a
/// map of state code to rates.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum CountryTaxes {
    ByState(BTreeMap<String, Vec<TaxEntry>>),
    Flat(Vec<TaxEntry>),
}

#[derive(Debug, Serialize, Deserialize)]
struct TaxEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    display_name: String,
    percentage: f64,
    #[serde(default)]
    inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl PriceEntry {
    fn into_price(self, product: Option<String>) -> Price {
        Price {
            id: self.id,
            product,
            nickname: self.nickname,
            unit_amount: self.unit_amount,
            currency: self.currency,
            interval: self.interval,
            interval_count: self.interval_count,
            active: self.active,
            metadata: self.metadata,
        }
    }

    fn from_price(price: &Price) -> Self {
        Self {
            id: price.id.clone(),
            nickname: price.nickname.clone(),
            unit_amount: price.unit_amount,
            currency: price.currency.clone(),
            interval: price.interval.clone(),
            interval_count: price.interval_count,
            active: price.active,
            metadata: price.metadata.clone(),
        }
    }
}

impl TaxEntry {
    fn into_tax(self, jurisdiction: String) -> TaxRate {
        TaxRate {
            id: self.id,
            display_name: self.display_name,
            percentage: self.percentage,
            inclusive: self.inclusive,
            jurisdiction,
            description: self.description,
            active: self.active,
            metadata: self.metadata,
        }
    }

    fn from_tax(tax: &TaxRate) -> Self {
        Self {
            id: tax.id.clone(),
            display_name: tax.display_name.clone(),
            percentage: tax.percentage,
            inclusive: tax.inclusive,
            description: tax.description.clone(),
            active: tax.active,
            metadata: tax.metadata.clone(),
        }
    }
}

// ============================================================================
// Load
// ============================================================================

/// Load the local catalog file, flattening nested structures.
///
/// Prices under a product that already has an id move to the flat price
/// list, each recording that id; prices under an id-less product stay
/// nested on the product, since there is no id to reference yet. Tax
/// country keys may be a code or a full country name; both normalize to the
/// code before the jurisdiction label is built. All lists come back sorted
/// by id.
pub fn load(path: &Path) -> Result<Catalog> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    let file: CatalogFile =
        serde_json::from_str(&content).map_err(|e| Error::invalid(path, e.to_string()))?;

    let mut catalog = Catalog::default();

    for entry in file.products {
        let mut product = Product {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            active: entry.active,
            metadata: entry.metadata,
            prices: Vec::new(),
        };
        match &product.id {
            Some(id) => {
                for price in entry.prices {
                    catalog.prices.push(price.into_price(Some(id.clone())));
                }
            }
            None => {
                product.prices = entry
                    .prices
                    .into_iter()
                    .map(|p| p.into_price(None))
                    .collect();
            }
        }
        catalog.products.push(product);
    }

    for (key, group) in file.taxes {
        let country = resolve_country(path, &key)?;
        match group {
            CountryTaxes::Flat(entries) => {
                let label = geography::jurisdiction_label(country, None);
                for entry in entries {
                    catalog.taxes.push(entry.into_tax(label.clone()));
                }
            }
            CountryTaxes::ByState(states) => {
                for (state, entries) in states {
                    let label = geography::jurisdiction_label(country, Some(state.as_str()));
                    for entry in entries {
                        catalog.taxes.push(entry.into_tax(label.clone()));
                    }
                }
            }
        }
    }

    catalog.coupons = file.coupons;
    catalog.sort();

    debug!(
        "loaded {}: {} products, {} prices, {} tax rates, {} coupons",
        path.display(),
        catalog.products.len(),
        catalog.prices.len(),
        catalog.taxes.len(),
        catalog.coupons.len()
    );
    Ok(catalog)
}

/// Accept a country key as a code or a full name; normalize to the code.
fn resolve_country<'a>(path: &Path, key: &'a str) -> Result<&'a str> {
    if geography::country_name(key).is_some() {
        return Ok(key);
    }
    if let Some(code) = geography::country_code(key) {
        return Ok(code);
    }
    Err(Error::invalid(
        path,
        format!("unknown country in taxes section: {key:?}"),
    ))
}

// ============================================================================
// Save
// ============================================================================

/// Write the catalog back to disk, re-nesting what [`load`] flattened.
///
/// Flat prices re-nest under their owning product by id; jurisdiction
/// labels parse back into country/state keys. This is the inverse of
/// [`load`]: `load(save(catalog))` yields the same catalog.
pub fn save(path: &Path, catalog: &Catalog) -> Result<()> {
    let mut file = CatalogFile::default();

    for product in &catalog.products {
        let prices = match &product.id {
            Some(id) => catalog
                .prices
                .iter()
                .filter(|p| p.product.as_deref() == Some(id))
                .map(PriceEntry::from_price)
                .collect(),
            None => product.prices.iter().map(PriceEntry::from_price).collect(),
        };
        file.products.push(ProductEntry {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            active: product.active,
            metadata: product.metadata.clone(),
            prices,
        });
    }

    let mut flat: BTreeMap<String, Vec<TaxEntry>> = BTreeMap::new();
    let mut by_state: BTreeMap<String, BTreeMap<String, Vec<TaxEntry>>> = BTreeMap::new();
    for tax in &catalog.taxes {
        let (country, state) = geography::parse_jurisdiction(&tax.jurisdiction);
        match state {
            Some(state) => by_state
                .entry(country)
                .or_default()
                .entry(state)
                .or_default()
                .push(TaxEntry::from_tax(tax)),
            None => flat.entry(country).or_default().push(TaxEntry::from_tax(tax)),
        }
    }
    for (country, entries) in flat {
        if by_state.contains_key(&country) {
            return Err(Error::invalid(
                path,
                format!("country {country} mixes state-level and country-level tax rates"),
            ));
        }
        file.taxes.insert(country, CountryTaxes::Flat(entries));
    }
    for (country, states) in by_state {
        file.taxes.insert(country, CountryTaxes::ByState(states));
    }

    file.coupons = catalog.coupons.clone();

    let content = serde_json::to_string_pretty(&file)
        .map_err(|e| Error::invalid(path, e.to_string()))?;
    fs::write(path, content + "\n").map_err(|e| Error::io(path, e))?;

    debug!("wrote {}", path.display());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
