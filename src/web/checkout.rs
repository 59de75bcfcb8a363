//! Checkout handlers.

use super::{AppState, cart::with_image_urls, extract::Shopper};
use crate::core::{
    cart::CartSummary,
    checkout::{self, CheckoutIdentity, CheckoutRequest, ShippingDetails},
    customer,
    guest::{self, GuestContact},
};
use crate::errors::{Error, Result};
use crate::payment::{PaymentHandoff, PaymentRequest};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Body of `GET /checkout`.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    cart: CartSummary,
    payment: Option<PaymentHandoff>,
}

/// `GET /checkout`
///
/// Returns the cart and, when there is something to pay for, the payment handoff.
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>, shopper: Shopper) -> Result<Json<CheckoutResponse>> {
    let (summary, transaction_id) = match &shopper {
        Shopper::Account {
            customer: Some(customer),
            ..
        } => {
            let session = checkout::begin_checkout(state.db(), customer.id).await?;
            let transaction_id = session.order.and_then(|order| order.transaction_id);
            (session.summary, transaction_id)
        }
        Shopper::Account { customer: None, .. } | Shopper::Guest(None) => (CartSummary::empty(), None),
        Shopper::Guest(Some(token)) => {
            // The cart remembers the id so completion reuses it
            let transaction_id = state.guest_carts().begin_checkout(*token).await;
            let snapshot = state.guest_carts().snapshot(token).await;
            let summary = guest::price_snapshot(state.db(), &snapshot).await?;
            (summary, Some(transaction_id))
        }
    };

    let payment = match transaction_id {
        Some(transaction_id) if summary.total > Decimal::ZERO => {
            let settings = state.settings();
            let request = PaymentRequest {
                amount: summary.total,
                currency: settings.currency.clone(),
                description: settings.payment_description.clone(),
                transaction_id,
            };
            Some(state.gateway().initiate_payment(&request)?)
        }
        _ => None,
    };

    Ok(Json(CheckoutResponse {
        cart: with_image_urls(summary, &state.settings().media_url),
        payment,
    }))
}

/// Checkout form fields.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    total: Decimal,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Body of `POST /process_order`.
#[derive(Debug, Deserialize)]
pub struct ProcessOrderRequest {
    form: CheckoutForm,
    #[serde(default)]
    shipping: Option<ShippingDetails>,
}

/// Reply to a completed checkout.
#[derive(Debug, Serialize)]
pub struct ProcessOrderResponse {
    message: &'static str,
    order_id: i64,
    transaction_id: Option<String>,
}

/// `POST /process_order`
#[instrument(skip_all)]
pub async fn process_order(
    State(state): State<AppState>,
    shopper: Shopper,
    payload: std::result::Result<Json<ProcessOrderRequest>, JsonRejection>,
) -> Result<Json<ProcessOrderResponse>> {
    let Json(ProcessOrderRequest { form, shipping }) = payload?;

    let (identity, guest_token) = match shopper {
        Shopper::Account { principal, .. } => {
            let customer = customer::resolve_account(state.db(), &principal).await?;
            (CheckoutIdentity::Customer(customer.id), None)
        }
        Shopper::Guest(token) => {
            let (Some(name), Some(email)) = (form.name, form.email) else {
                return Err(Error::invalid_input("name and email are required for guest checkout"));
            };
            let cart = match &token {
                Some(token) => state.guest_carts().snapshot(token).await,
                None => guest::CartSnapshot::default(),
            };
            (
                CheckoutIdentity::Guest {
                    contact: GuestContact { name, email },
                    cart,
                },
                token,
            )
        }
    };

    let receipt = checkout::process_order(
        state.db(),
        CheckoutRequest {
            identity,
            submitted_total: form.total,
            shipping,
        },
    )
    .await?;

    if let Some(token) = guest_token {
        state.guest_carts().clear(&token).await;
    }
    info!("Checkout complete for order {}", receipt.order.id);

    Ok(Json(ProcessOrderResponse {
        message: "Payment complete!",
        order_id: receipt.order.id,
        transaction_id: receipt.order.transaction_id,
    }))
}
