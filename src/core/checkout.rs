//! Checkout business logic - Finalizes open orders.
//!
//! An order moves from incomplete to complete exactly once. Finalization recomputes the
//! cart total from the database and only completes the order when the total the shopper
//! saw matches it to the cent. Everything a checkout writes (guest customer, order,
//! order items, completion, shipping address) happens in one transaction, so a rejected
//! checkout leaves no trace.

use crate::{
    core::{
        cart::{self, CartSummary},
        customer,
        guest::{self, CartSnapshot, GuestContact},
        order as orders,
    },
    entities::{ShippingAddress, customer as customer_entity, order, shipping_address},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, info};

/// Shipping details submitted with the checkout form.
///
/// Fields are free text and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShippingDetails {
    /// Street address
    #[serde(default)]
    pub address: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// State or region
    #[serde(default)]
    pub state: String,
    /// Postal code
    #[serde(default)]
    pub zipcode: String,
}

/// Who is checking out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutIdentity {
    /// A known customer paying for their open order
    Customer(i64),
    /// A guest paying for the cart held under their token
    Guest {
        /// Contact details typed at checkout
        contact: GuestContact,
        /// Cart contents to adopt into the order
        cart: CartSnapshot,
    },
}

/// A checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    /// Who is paying
    pub identity: CheckoutIdentity,
    /// Total shown to the shopper when they submitted the form
    pub submitted_total: Decimal,
    /// Shipping details, required only when the order contains physical goods
    pub shipping: Option<ShippingDetails>,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    /// The now complete order
    pub order: order::Model,
    /// The customer who owns the order
    pub customer: customer_entity::Model,
    /// Total that was charged
    pub total: Decimal,
    /// Stored shipping address, if the order ships
    pub shipping_address: Option<shipping_address::Model>,
}

/// State handed to the payment step before the shopper submits the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Open order with a fresh transaction id, None when the customer has no cart yet
    pub order: Option<order::Model>,
    /// Cart contents and derived values
    pub summary: CartSummary,
}

/// Prepares a customer's open order for payment.
///
/// Stamps a fresh transaction id on the open order so each payment attempt is
/// distinguishable. Does not create an order when none is open.
pub async fn begin_checkout<C>(db: &C, customer_id: i64) -> Result<CheckoutSession>
where
    C: ConnectionTrait,
{
    let Some(open) = orders::find_open_order(db, customer_id).await? else {
        return Ok(CheckoutSession {
            order: None,
            summary: CartSummary::empty(),
        });
    };

    let order = orders::stamp_transaction_id(db, open).await?;
    let summary = cart::summarize_order(db, &order).await?;
    debug!(
        "Checkout started for order {} with transaction {:?}",
        order.id, order.transaction_id
    );

    Ok(CheckoutSession {
        order: Some(order),
        summary,
    })
}

/// Processes a checkout submission in one transaction.
///
/// Resolves the customer and their open order (adopting the guest cart for guests),
/// then finalizes the order. Any error rolls the whole checkout back.
///
/// # Errors
/// - `CustomerNotFound` if a customer identity does not exist
/// - `InvalidInput` for an empty cart, bad guest details, or missing shipping details
/// - `TotalMismatch` if the submitted total differs from the cart total
pub async fn process_order(db: &DatabaseConnection, request: CheckoutRequest) -> Result<CheckoutReceipt> {
    let txn = db.begin().await?;

    let (customer, order) = match &request.identity {
        CheckoutIdentity::Customer(customer_id) => {
            let customer = customer::get_customer_by_id(&txn, *customer_id)
                .await?
                .ok_or_else(|| Error::CustomerNotFound {
                    identity: customer_id.to_string(),
                })?;
            let order = orders::get_or_create_open_order(&txn, customer.id).await?;
            (customer, order)
        }
        CheckoutIdentity::Guest { contact, cart } => {
            guest::resolve_guest_order(&txn, contact, cart).await?
        }
    };

    let receipt = finalize_order(
        &txn,
        customer,
        order,
        request.submitted_total,
        request.shipping.as_ref(),
    )
    .await?;

    txn.commit().await?;
    info!(
        "Order {} completed for customer {} (total {}, transaction {:?})",
        receipt.order.id, receipt.customer.id, receipt.total, receipt.order.transaction_id
    );
    Ok(receipt)
}

/// Completes an order whose computed total matches the submitted one.
///
/// Writes a shipping address bound to the customer and order when the order contains a
/// physical product. Callers wanting all-or-nothing behavior pass a transaction.
///
/// # Errors
/// - `OrderAlreadyComplete` if the order was finalized before
/// - `InvalidInput` if the order has no items, or shipping is required but missing
/// - `TotalMismatch` if `submitted_total` differs from the cart total
pub async fn finalize_order<C>(
    db: &C,
    customer: customer_entity::Model,
    order: order::Model,
    submitted_total: Decimal,
    shipping: Option<&ShippingDetails>,
) -> Result<CheckoutReceipt>
where
    C: ConnectionTrait,
{
    if order.complete {
        return Err(Error::OrderAlreadyComplete { order_id: order.id });
    }

    let rows = cart::get_order_items(db, order.id).await?;
    if rows.is_empty() {
        return Err(Error::invalid_input("cannot check out an empty cart"));
    }

    let expected = cart::cart_total(&rows);
    if submitted_total != expected {
        return Err(Error::TotalMismatch {
            submitted: submitted_total,
            expected,
        });
    }

    let needs_shipping = cart::requires_shipping(&rows);
    let shipping = match (needs_shipping, shipping) {
        (true, None) => {
            return Err(Error::invalid_input(
                "shipping details are required for physical products",
            ));
        }
        (true, Some(details)) => Some(details),
        (false, _) => None,
    };

    // Complete under the id the payment form was built with, if checkout was started
    let transaction_id = order
        .transaction_id
        .clone()
        .unwrap_or_else(orders::new_transaction_id);
    let order = orders::mark_complete(db, order, transaction_id).await?;

    let shipping_address = match shipping {
        Some(details) => {
            let address = shipping_address::ActiveModel {
                customer_id: Set(Some(customer.id)),
                order_id: Set(Some(order.id)),
                address: Set(details.address.clone()),
                city: Set(details.city.clone()),
                state: Set(details.state.clone()),
                zipcode: Set(details.zipcode.clone()),
                date_added: Set(chrono::Utc::now()),
                ..Default::default()
            };
            Some(address.insert(db).await?)
        }
        None => None,
    };

    Ok(CheckoutReceipt {
        order,
        customer,
        total: expected,
        shipping_address,
    })
}

/// Lists the shipping addresses recorded for an order.
pub async fn shipping_addresses_for_order<C>(
    db: &C,
    order_id: i64,
) -> Result<Vec<shipping_address::Model>>
where
    C: ConnectionTrait,
{
    ShippingAddress::find()
        .filter(shipping_address::Column::OrderId.eq(order_id))
        .all(db)
        .await
        .map_err(Into::into)
}
