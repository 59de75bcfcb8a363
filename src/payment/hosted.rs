//! Hosted checkout form in the LiqPay style.
//!
//! The form carries two fields: `data`, the base64 of a JSON payload describing the
//! payment, and `signature`, `base64(sha1(private_key + data + private_key))`.
//! The provider recomputes the signature to verify the merchant.

use super::{PaymentGateway, PaymentHandoff, PaymentRequest};
use crate::config::payment::PaymentCredentials;
use crate::errors::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use tracing::debug;

const API_VERSION: u8 = 3;
const PAY_ACTION: &str = "pay";

// Field order is the serialized key order.
#[derive(Serialize)]
struct FormPayload<'a> {
    action: &'a str,
    amount: String,
    currency: &'a str,
    description: &'a str,
    order_id: &'a str,
    public_key: &'a str,
    version: u8,
}

/// Gateway that renders a signed hosted checkout form.
#[derive(Debug, Clone)]
pub struct HostedFormGateway {
    credentials: PaymentCredentials,
    checkout_url: String,
}

impl HostedFormGateway {
    /// Creates a gateway posting to `checkout_url`.
    #[must_use]
    pub const fn new(credentials: PaymentCredentials, checkout_url: String) -> Self {
        Self {
            credentials,
            checkout_url,
        }
    }

    /// Encodes the payment payload as the form's `data` field.
    fn encode_data(&self, request: &PaymentRequest) -> Result<String> {
        let payload = FormPayload {
            action: PAY_ACTION,
            amount: format!("{:.2}", request.amount),
            currency: &request.currency,
            description: &request.description,
            order_id: &request.transaction_id,
            public_key: &self.credentials.public_key,
            version: API_VERSION,
        };
        let json = serde_json::to_string(&payload).map_err(|e| Error::Payment {
            message: format!("Failed to encode payment payload: {e}"),
        })?;
        Ok(STANDARD.encode(json))
    }

    /// Signs an encoded payload with the private key.
    #[must_use]
    pub fn sign(&self, data: &str) -> String {
        let private_key = &self.credentials.private_key;
        let mut hasher = Sha1::new();
        hasher.update(private_key.as_bytes());
        hasher.update(data.as_bytes());
        hasher.update(private_key.as_bytes());
        STANDARD.encode(hasher.finalize())
    }
}

impl PaymentGateway for HostedFormGateway {
    fn initiate_payment(&self, request: &PaymentRequest) -> Result<PaymentHandoff> {
        if request.amount <= rust_decimal::Decimal::ZERO {
            return Err(Error::Payment {
                message: format!("Payment amount must be positive, got {}", request.amount),
            });
        }

        let data = self.encode_data(request)?;
        let signature = self.sign(&data);
        debug!(
            "Built hosted payment form for transaction {}",
            request.transaction_id
        );

        let fields = BTreeMap::from([
            ("data".to_string(), data),
            ("signature".to_string(), signature),
        ]);
        Ok(PaymentHandoff::Form {
            action_url: self.checkout_url.clone(),
            fields,
        })
    }
}
