//! Payment gateway abstraction.
//!
//! Checkout produces a [`PaymentRequest`]; a [`PaymentGateway`] turns it into a
//! [`PaymentHandoff`] the client follows to pay (a form to post or a URL to visit).
//! The storefront never talks to the payment provider over the network itself.

/// Hosted checkout form gateway with signed payloads
pub mod hosted;

pub use hosted::HostedFormGateway;

use crate::errors::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// What the shopper is asked to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Amount in the store currency
    pub amount: Decimal,
    /// ISO currency code, e.g. "UAH"
    pub currency: String,
    /// Free-text description shown by the provider
    pub description: String,
    /// Identifier of this payment attempt
    pub transaction_id: String,
}

/// How the client continues to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentHandoff {
    /// Post `fields` to `action_url`
    Form {
        /// Provider endpoint receiving the form
        action_url: String,
        /// Hidden form fields
        fields: BTreeMap<String, String>,
    },
    /// Navigate to `url`
    Redirect {
        /// Provider page for this payment
        url: String,
    },
}

/// A payment provider integration.
pub trait PaymentGateway: Send + Sync {
    /// Builds the handoff for a payment request.
    ///
    /// # Errors
    /// Returns `Payment` if the request cannot be handed to the provider.
    fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentHandoff>;
}
