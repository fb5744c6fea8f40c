//! The REST client behind [`reconcile::BillingApi`].

use crate::error::{Error, Result};
use crate::wire::{ApiCoupon, ApiPrice, ApiProduct, ApiTaxRate, List};
use crate::{API_KEY_VAR, API_URL_VAR};
use catalog::{Coupon, Price, Product, TaxRate};
use log::debug;
use reconcile::{BillingApi, Page, Params};
use serde::de::DeserializeOwned;

/// Production API endpoint, overridable through `TARIFA_API_URL`.
pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Listing page size. The provider caps it at 100; asking for the maximum
/// keeps the sequential pagination walk short.
const PAGE_LIMIT: &str = "100";

/// Authenticated HTTP client for the billing provider.
#[derive(Debug)]
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
    auth: String,
}

impl Client {
    /// Build a client from `TARIFA_API_KEY` and optionally `TARIFA_API_URL`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
        let base_url = std::env::var(API_URL_VAR).ok().filter(|u| !u.is_empty());
        Self::from_key(key, base_url)
    }

    /// Build a client from an explicit key and base URL.
    pub fn from_key(key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let key = key.ok_or(Error::AuthMissing)?;
        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            auth: format!("Bearer {key}"),
        })
    }

    /// Get the base URL in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        starting_after: Option<&str>,
    ) -> Result<List<T>> {
        debug!("GET {path} starting_after={starting_after:?}");
        let mut request = self
            .agent
            .get(&self.url(path))
            .header("Authorization", &self.auth)
            .query("limit", PAGE_LIMIT);
        if let Some(cursor) = starting_after {
            request = request.query("starting_after", cursor);
        }
        request
            .call()?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    fn post<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T> {
        debug!("POST {path} ({} fields)", params.len());
        self.agent
            .post(&self.url(path))
            .header("Authorization", &self.auth)
            .send_form(params.iter())?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    fn delete(&self, path: &str) -> Result<()> {
        debug!("DELETE {path}");
        self.agent
            .delete(&self.url(path))
            .header("Authorization", &self.auth)
            .call()?;
        Ok(())
    }
}

fn page<A, T: From<A>>(list: List<A>) -> Page<T> {
    Page {
        data: list.data.into_iter().map(Into::into).collect(),
        has_more: list.has_more,
    }
}

impl BillingApi for Client {
    fn list_products(&self, starting_after: Option<&str>) -> anyhow::Result<Page<Product>> {
        Ok(page(self.list::<ApiProduct>("products", starting_after)?))
    }

    fn list_prices(&self, starting_after: Option<&str>) -> anyhow::Result<Page<Price>> {
        Ok(page(self.list::<ApiPrice>("prices", starting_after)?))
    }

    fn list_tax_rates(&self, starting_after: Option<&str>) -> anyhow::Result<Page<TaxRate>> {
        Ok(page(self.list::<ApiTaxRate>("tax_rates", starting_after)?))
    }

    fn list_coupons(&self, starting_after: Option<&str>) -> anyhow::Result<Page<Coupon>> {
        Ok(page(self.list::<ApiCoupon>("coupons", starting_after)?))
    }

    fn create_product(&self, params: &Params) -> anyhow::Result<Product> {
        Ok(self.post::<ApiProduct>("products", params)?.into())
    }

    fn update_product(&self, id: &str, params: &Params) -> anyhow::Result<Product> {
        Ok(self
            .post::<ApiProduct>(&format!("products/{id}"), params)?
            .into())
    }

    fn create_price(&self, params: &Params) -> anyhow::Result<Price> {
        Ok(self.post::<ApiPrice>("prices", params)?.into())
    }

    fn update_price(&self, id: &str, params: &Params) -> anyhow::Result<Price> {
        Ok(self
            .post::<ApiPrice>(&format!("prices/{id}"), params)?
            .into())
    }

    fn create_tax_rate(&self, params: &Params) -> anyhow::Result<TaxRate> {
        Ok(self.post::<ApiTaxRate>("tax_rates", params)?.into())
    }

    fn update_tax_rate(&self, id: &str, params: &Params) -> anyhow::Result<TaxRate> {
        Ok(self
            .post::<ApiTaxRate>(&format!("tax_rates/{id}"), params)?
            .into())
    }

    fn create_coupon(&self, params: &Params) -> anyhow::Result<Coupon> {
        Ok(self.post::<ApiCoupon>("coupons", params)?.into())
    }

    fn update_coupon(&self, id: &str, params: &Params) -> anyhow::Result<Coupon> {
        Ok(self
            .post::<ApiCoupon>(&format!("coupons/{id}"), params)?
            .into())
    }

    fn delete_coupon(&self, id: &str) -> anyhow::Result<()> {
        Ok(self.delete(&format!("coupons/{id}"))?)
    }
}
