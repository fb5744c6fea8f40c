//! Billing provider REST client.
//!
//! [`Client`] implements [`reconcile::BillingApi`] over the provider's
//! form-encoded HTTP API. Credentials come from the environment:
//! `TARIFA_API_KEY` holds the secret key, and `TARIFA_API_URL` points the
//! client at a non-production endpoint (a local API stub, usually).

mod client;
mod error;
pub mod wire;

/// Environment variable holding the provider secret key.
pub const API_KEY_VAR: &str = "TARIFA_API_KEY";

/// Environment variable overriding the API endpoint.
pub const API_URL_VAR: &str = "TARIFA_API_URL";

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::{Error, Result};
