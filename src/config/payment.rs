//! Payment gateway credentials loaded from environment variables.
//!
//! Keys are read from `PAYMENT_PUBLIC_KEY` and `PAYMENT_PRIVATE_KEY`, usually
//! provided through the `.env` file. They are never stored in config.toml.

use crate::errors::{Error, Result};

/// Environment variable holding the merchant public key
pub const PUBLIC_KEY_VAR: &str = "PAYMENT_PUBLIC_KEY";
/// Environment variable holding the merchant private key
pub const PRIVATE_KEY_VAR: &str = "PAYMENT_PRIVATE_KEY";

/// Merchant key pair for the hosted checkout gateway
#[derive(Clone)]
pub struct PaymentCredentials {
    /// Public key, sent in the clear inside the payment form
    pub public_key: String,
    /// Private key, only used to sign payment forms
    pub private_key: String,
}

impl std::fmt::Debug for PaymentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCredentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl PaymentCredentials {
    /// Reads both keys from the environment.
    ///
    /// # Errors
    /// Returns an error if either variable is missing or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Config {
                    message: format!("{name} is not set"),
                })
        };

        Ok(Self {
            public_key: read(PUBLIC_KEY_VAR)?,
            private_key: read(PRIVATE_KEY_VAR)?,
        })
    }
}
