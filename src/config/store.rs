//! Store configuration loading from config.toml
//!
//! The `[store]` table holds server and checkout settings; the `[[products]]`
//! array seeds the catalog on startup. Products already present by name are
//! left untouched by seeding.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Server and checkout settings
    #[serde(default)]
    pub store: StoreSettings,
    /// Catalog entries to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Server and checkout settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreSettings {
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// ISO 4217 currency code sent to the payment gateway
    pub currency: String,
    /// Description attached to every payment request
    pub payment_description: String,
    /// Base URL product images are served from
    pub media_url: String,
    /// Hosted checkout endpoint the payment form posts to
    pub checkout_url: String,
    /// How long an idle guest cart is kept, in seconds
    pub guest_cart_ttl_secs: u64,
    /// Maximum number of guest carts held at once
    pub guest_cart_capacity: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            currency: "UAH".to_string(),
            payment_description: "Order description".to_string(),
            media_url: "/images/".to_string(),
            checkout_url: "https://www.liqpay.ua/api/3/checkout".to_string(),
            guest_cart_ttl_secs: 7 * 24 * 60 * 60,
            guest_cart_capacity: 10_000,
        }
    }
}

/// Configuration for a single catalog product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Name of the product
    pub name: String,
    /// Unit price in the store currency (e.g., 19.99)
    pub price: Decimal,
    /// Whether the product is delivered digitally
    #[serde(default)]
    pub digital: Option<bool>,
    /// Optional image path relative to `media_url`
    #[serde(default)]
    pub image: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

/// Loads store configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses store configuration from TOML text
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads store configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_store_config() {
        let toml_str = r#"
            [store]
            bind_address = "0.0.0.0:9000"
            currency = "USD"

            [[products]]
            name = "Headphones"
            price = 49.99
            image = "headphones.jpg"
            description = "Over-ear"

            [[products]]
            name = "Soundtrack"
            price = "9.5"
            digital = true
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.store.bind_address, "0.0.0.0:9000");
        assert_eq!(config.store.currency, "USD");
        // Unspecified settings keep their defaults
        assert_eq!(config.store.media_url, "/images/");

        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].price, Decimal::new(4999, 2));
        assert_eq!(config.products[0].digital, None);
        assert_eq!(config.products[1].price, Decimal::new(95, 1));
        assert_eq!(config.products[1].digital, Some(true));
        assert!(config.products[1].image.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.products.is_empty());
        assert_eq!(config.store.currency, "UAH");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("[[products]]\nname = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
