//! Guest carts and guest identity resolution.
//!
//! Shoppers without an account keep their cart server-side under a `GuestCartToken`
//! that the client presents on every request. The token maps to a `CartSnapshot`
//! (product id -> quantity) held in an expiring in-memory store. At checkout the
//! snapshot is copied into a real order owned by a customer resolved from the guest's
//! contact details.

use crate::{
    core::{
        cart::{self, CartAction, CartLine, CartSummary},
        customer, order as orders,
    },
    entities::{OrderItem, Product, customer as customer_entity, order, order_item, product},
    errors::{Error, Result},
};
use moka::future::Cache;
use sea_orm::{Condition, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Opaque token identifying one guest cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestCartToken(Uuid);

impl GuestCartToken {
    /// Issues a new random token.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GuestCartToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuestCartToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GuestCartToken {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| Error::invalid_input("malformed guest cart token"))
    }
}

/// Quantities held in a guest cart, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    lines: BTreeMap<i64, i32>,
    transaction_id: Option<String>,
}

impl CartSnapshot {
    /// Applies an add/remove action and returns the resulting quantity.
    ///
    /// A quantity that reaches zero removes the line, matching persisted carts.
    pub fn apply(&mut self, product_id: i64, action: CartAction) -> i32 {
        let quantity = self.quantity(product_id) + action.delta();
        if quantity <= 0 {
            self.lines.remove(&product_id);
            0
        } else {
            self.lines.insert(product_id, quantity);
            quantity
        }
    }

    /// Current quantity for a product, zero if absent.
    #[must_use]
    pub fn quantity(&self, product_id: i64) -> i32 {
        self.lines.get(&product_id).copied().unwrap_or(0)
    }

    /// Whether the snapshot holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.values().map(|quantity| i64::from(*quantity)).sum()
    }

    /// Iterates `(product_id, quantity)` pairs in product id order.
    pub fn lines(&self) -> impl Iterator<Item = (i64, i32)> + '_ {
        self.lines.iter().map(|(product_id, quantity)| (*product_id, *quantity))
    }

    /// Transaction id of the last payment form built for this cart.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Starts a payment attempt, replacing any previous transaction id.
    pub fn begin_checkout(&mut self) -> String {
        let transaction_id = orders::new_transaction_id();
        self.transaction_id = Some(transaction_id.clone());
        transaction_id
    }
}

/// Expiring store of guest carts.
#[derive(Clone)]
pub struct GuestCarts {
    cache: Cache<GuestCartToken, CartSnapshot>,
}

impl GuestCarts {
    /// Creates a store that forgets carts idle for longer than `ttl`.
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(ttl)
            .build();
        Self { cache }
    }

    /// Returns the snapshot for a token, empty if unknown or expired.
    pub async fn snapshot(&self, token: &GuestCartToken) -> CartSnapshot {
        self.cache.get(token).await.unwrap_or_default()
    }

    /// Applies an action to the token's cart and returns the resulting quantity.
    ///
    /// The read-modify-write is atomic per token.
    pub async fn apply(&self, token: GuestCartToken, product_id: i64, action: CartAction) -> i32 {
        let entry = self
            .cache
            .entry(token)
            .and_upsert_with(|existing| {
                let mut snapshot = existing.map(|entry| entry.into_value()).unwrap_or_default();
                snapshot.apply(product_id, action);
                std::future::ready(snapshot)
            })
            .await;
        entry.into_value().quantity(product_id)
    }

    /// Stamps a fresh transaction id on the token's cart and returns it.
    ///
    /// The id is carried into the order when the guest checks out, so the completed
    /// order matches the payment form built with it.
    pub async fn begin_checkout(&self, token: GuestCartToken) -> String {
        let entry = self
            .cache
            .entry(token)
            .and_upsert_with(|existing| {
                let mut snapshot = existing.map(|entry| entry.into_value()).unwrap_or_default();
                snapshot.begin_checkout();
                std::future::ready(snapshot)
            })
            .await;
        entry
            .into_value()
            .transaction_id
            .unwrap_or_else(orders::new_transaction_id)
    }

    /// Drops the token's cart, typically after a successful checkout.
    pub async fn clear(&self, token: &GuestCartToken) {
        self.cache.invalidate(token).await;
    }
}

/// Prices a guest snapshot against the current catalog.
///
/// Lines whose product no longer exists are skipped.
pub async fn price_snapshot<C>(db: &C, snapshot: &CartSnapshot) -> Result<CartSummary>
where
    C: ConnectionTrait,
{
    if snapshot.is_empty() {
        return Ok(CartSummary::empty());
    }

    let ids: Vec<i64> = snapshot.lines().map(|(product_id, _)| product_id).collect();
    let products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let lines = snapshot
        .lines()
        .filter_map(|(product_id, quantity)| match products.get(&product_id) {
            Some(product) => Some(CartLine::for_product(product, quantity)),
            None => {
                warn!("Skipping guest cart line for missing product {}", product_id);
                None
            }
        })
        .collect();

    Ok(CartSummary::from_lines(lines))
}

/// Contact details a guest types at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuestContact {
    /// Name to store on the customer
    pub name: String,
    /// Email used to find or create the customer
    pub email: String,
}

/// Resolves a guest's customer and open order, copying the snapshot into the order.
///
/// Afterwards the order holds exactly the snapshot: snapshot quantities replace the
/// order's, and order lines not in the snapshot are removed. Lines for products missing
/// from the catalog are skipped. The snapshot's transaction id, if any, is recorded on
/// the order. Repeated calls with the same email reuse one customer and one open order.
///
/// # Errors
/// Returns `InvalidInput` if the email belongs to a registered account.
pub async fn resolve_guest_order<C>(
    db: &C,
    contact: &GuestContact,
    snapshot: &CartSnapshot,
) -> Result<(customer_entity::Model, order::Model)>
where
    C: ConnectionTrait,
{
    let customer = customer::get_or_create_guest(db, &contact.name, &contact.email).await?;
    let order = orders::get_or_create_open_order(db, customer.id).await?;

    let ids: Vec<i64> = snapshot.lines().map(|(product_id, _)| product_id).collect();
    let known: Vec<i64> = Product::find()
        .filter(product::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|product| product.id)
        .collect();

    for (product_id, quantity) in snapshot.lines() {
        if !known.contains(&product_id) {
            warn!("Guest cart references missing product {}", product_id);
            continue;
        }
        cart::set_item_quantity(db, order.id, product_id, quantity).await?;
    }

    let stale = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order.id))
        .filter(
            Condition::any()
                .add(order_item::Column::ProductId.is_null())
                .add(order_item::Column::ProductId.is_not_in(known)),
        )
        .exec(db)
        .await?;
    if stale.rows_affected > 0 {
        debug!(
            "Dropped {} order line(s) not in guest cart from order {}",
            stale.rows_affected, order.id
        );
    }

    let order = match snapshot.transaction_id() {
        Some(transaction_id) => {
            orders::set_transaction_id(db, order, transaction_id.to_string()).await?
        }
        None => order,
    };

    debug!(
        "Resolved guest {} to customer {} and order {}",
        customer.email, customer.id, order.id
    );
    Ok((customer, order))
}
