//! Cart business logic - Item mutation and cart-derived values.
//!
//! A customer's cart is the set of items on their open order. This module adjusts
//! item quantities and computes the derived values the storefront shows: cart total,
//! item count, and whether the order needs shipping.
//!
//! Items whose product was removed from the catalog stay in the cart with a NULL
//! product. They contribute zero to the total, still count towards the item count, and
//! never require shipping.

use crate::{
    core::{catalog, order as orders},
    entities::{OrderItem, Product, order, order_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// An order item paired with its product, if the product still exists.
pub type CartRow = (order_item::Model, Option<product::Model>);

/// A change requested for one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Increase the quantity by one
    Add,
    /// Decrease the quantity by one, removing the line at zero
    Remove,
}

impl CartAction {
    /// Quantity change this action applies.
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Add => 1,
            Self::Remove => -1,
        }
    }
}

impl FromStr for CartAction {
    type Err = Error;

    fn from_str(action: &str) -> Result<Self> {
        match action {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            other => Err(Error::UnknownCartAction {
                action: other.to_string(),
            }),
        }
    }
}

/// Price of one line: unit price times quantity, zero when the product is gone.
#[must_use]
pub fn line_total(item: &order_item::Model, product: Option<&product::Model>) -> Decimal {
    product.map_or(Decimal::ZERO, |product| {
        product.price() * Decimal::from(item.quantity)
    })
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(rows: &[CartRow]) -> Decimal {
    rows.iter()
        .map(|(item, product)| line_total(item, product.as_ref()))
        .sum()
}

/// Sum of all quantities.
#[must_use]
pub fn cart_item_count(rows: &[CartRow]) -> i64 {
    rows.iter().map(|(item, _)| i64::from(item.quantity)).sum()
}

/// Whether any line holds a physical product.
#[must_use]
pub fn requires_shipping(rows: &[CartRow]) -> bool {
    rows.iter().any(|(_, product)| {
        product
            .as_ref()
            .is_some_and(|product| !product.is_digital())
    })
}

/// One line of a cart as shown to the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// Product on the line, None if it was removed from the catalog
    pub product_id: Option<i64>,
    /// Product name at the time of reading
    pub name: Option<String>,
    /// Unit price, zero when the product is gone
    pub unit_price: Decimal,
    /// Number of units
    pub quantity: i32,
    /// `unit_price * quantity`
    pub line_total: Decimal,
    /// Whether the product ships digitally
    pub digital: bool,
    /// Image reference, resolved against the media URL by the caller
    pub image: Option<String>,
}

impl CartLine {
    fn from_row((item, product): &CartRow) -> Self {
        Self {
            product_id: item.product_id,
            name: product.as_ref().map(|p| p.name.clone()),
            unit_price: product.as_ref().map_or(Decimal::ZERO, product::Model::price),
            quantity: item.quantity,
            line_total: line_total(item, product.as_ref()),
            digital: product.as_ref().is_some_and(product::Model::is_digital),
            image: product.as_ref().and_then(|p| p.image.clone()),
        }
    }

    /// Builds a line for a product that exists in the catalog.
    #[must_use]
    pub fn for_product(product: &product::Model, quantity: i32) -> Self {
        Self {
            product_id: Some(product.id),
            name: Some(product.name.clone()),
            unit_price: product.price(),
            quantity,
            line_total: product.price() * Decimal::from(quantity),
            digital: product.is_digital(),
            image: product.image.clone(),
        }
    }
}

/// Derived view of a whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    /// Open order backing the cart, None for guest carts and empty carts
    pub order_id: Option<i64>,
    /// Lines in the order they were added
    pub lines: Vec<CartLine>,
    /// Sum of line totals
    pub total: Decimal,
    /// Sum of quantities
    pub item_count: i64,
    /// Whether any line is a physical product
    pub requires_shipping: bool,
}

impl CartSummary {
    /// A cart with no lines.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            order_id: None,
            lines: Vec::new(),
            total: Decimal::ZERO,
            item_count: 0,
            requires_shipping: false,
        }
    }

    /// Summarizes persisted order rows.
    #[must_use]
    pub fn from_rows(order_id: i64, rows: &[CartRow]) -> Self {
        Self {
            order_id: Some(order_id),
            lines: rows.iter().map(CartLine::from_row).collect(),
            total: cart_total(rows),
            item_count: cart_item_count(rows),
            requires_shipping: requires_shipping(rows),
        }
    }

    /// Summarizes lines that were priced outside the database, such as guest carts.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(|line| line.line_total).sum();
        let item_count = lines.iter().map(|line| i64::from(line.quantity)).sum();
        let requires_shipping = lines
            .iter()
            .any(|line| line.product_id.is_some() && !line.digital);
        Self {
            order_id: None,
            lines,
            total,
            item_count,
            requires_shipping,
        }
    }
}

/// Loads every item of an order together with its product.
pub async fn get_order_items<C>(db: &C, order_id: i64) -> Result<Vec<CartRow>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Summarizes an order's current contents.
pub async fn summarize_order<C>(db: &C, order: &order::Model) -> Result<CartSummary>
where
    C: ConnectionTrait,
{
    let rows = get_order_items(db, order.id).await?;
    Ok(CartSummary::from_rows(order.id, &rows))
}

/// Summarizes the customer's cart without creating an open order.
pub async fn cart_summary_for_customer<C>(db: &C, customer_id: i64) -> Result<CartSummary>
where
    C: ConnectionTrait,
{
    match orders::find_open_order(db, customer_id).await? {
        Some(order) => summarize_order(db, &order).await,
        None => Ok(CartSummary::empty()),
    }
}

/// Makes sure an item row exists for (order, product), with quantity zero if new.
async fn ensure_item<C>(db: &C, order_id: i64, product_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let candidate = order_item::ActiveModel {
        product_id: Set(Some(product_id)),
        order_id: Set(Some(order_id)),
        quantity: Set(0),
        date_added: Set(chrono::Utc::now()),
        ..Default::default()
    };
    OrderItem::insert(candidate)
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn find_item<C>(db: &C, order_id: i64, product_id: i64) -> Result<Option<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .filter(order_item::Column::ProductId.eq(product_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Deletes the item if its quantity dropped to zero or below; returns the surviving item.
async fn prune_item<C>(db: &C, order_id: i64, product_id: i64) -> Result<Option<order_item::Model>>
where
    C: ConnectionTrait,
{
    match find_item(db, order_id, product_id).await? {
        Some(item) if item.quantity <= 0 => {
            debug!(
                "Removing product {} from order {} (quantity {})",
                product_id, order_id, item.quantity
            );
            item.delete(db).await?;
            Ok(None)
        }
        other => Ok(other),
    }
}

/// Applies a quantity change to the (order, product) line.
///
/// The change is a single `quantity = quantity + delta` update so concurrent requests
/// cannot lose increments. Returns the item, or None if it was removed.
pub async fn adjust_item_quantity<C>(
    db: &C,
    order_id: i64,
    product_id: i64,
    delta: i32,
) -> Result<Option<order_item::Model>>
where
    C: ConnectionTrait,
{
    ensure_item(db, order_id, product_id).await?;

    OrderItem::update_many()
        .col_expr(
            order_item::Column::Quantity,
            Expr::col(order_item::Column::Quantity).add(delta),
        )
        .filter(order_item::Column::OrderId.eq(order_id))
        .filter(order_item::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    prune_item(db, order_id, product_id).await
}

/// Sets the (order, product) line to an absolute quantity, removing it at zero or below.
pub async fn set_item_quantity<C>(
    db: &C,
    order_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<Option<order_item::Model>>
where
    C: ConnectionTrait,
{
    ensure_item(db, order_id, product_id).await?;

    OrderItem::update_many()
        .col_expr(order_item::Column::Quantity, Expr::value(quantity))
        .filter(order_item::Column::OrderId.eq(order_id))
        .filter(order_item::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    prune_item(db, order_id, product_id).await
}

/// Adds or removes one unit of a product in the customer's cart.
///
/// Finds or creates the customer's open order and the item for the product, then
/// applies the action. A quantity that reaches zero deletes the item. The whole
/// sequence runs in one database transaction.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist.
pub async fn add_or_remove_item(
    db: &DatabaseConnection,
    customer_id: i64,
    product_id: i64,
    action: CartAction,
) -> Result<Option<order_item::Model>> {
    let txn = db.begin().await?;

    catalog::require_product(&txn, product_id).await?;
    let order = orders::get_or_create_open_order(&txn, customer_id).await?;
    let item = adjust_item_quantity(&txn, order.id, product_id, action.delta()).await?;

    txn.commit().await?;

    debug!(
        "Customer {} {:?} product {} -> quantity {}",
        customer_id,
        action,
        product_id,
        item.as_ref().map_or(0, |item| item.quantity)
    );
    Ok(item)
}
