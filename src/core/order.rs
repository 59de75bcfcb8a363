//! Order business logic - Open order resolution and order state.
//!
//! Every customer has at most one incomplete ("open") order, which acts as their cart.
//! The open order is created lazily by an insert that does nothing when the partial
//! unique index already holds a row for the customer, followed by a re-read. Two racing
//! requests therefore always land on the same order.

use crate::{
    entities::{Order, order},
    errors::{Error, Result},
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::debug;
use uuid::Uuid;

/// Retrieves an order by ID.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an order by ID, failing with `OrderNotFound` if it does not exist.
pub async fn require_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    get_order_by_id(db, order_id)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })
}

/// Finds the customer's open order without creating one.
pub async fn find_open_order<C>(db: &C, customer_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .filter(order::Column::Complete.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the customer's open order, creating it if absent.
pub async fn get_or_create_open_order<C>(db: &C, customer_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_open_order(db, customer_id).await? {
        return Ok(existing);
    }

    let candidate = order::ActiveModel {
        customer_id: Set(Some(customer_id)),
        date_ordered: Set(chrono::Utc::now()),
        complete: Set(false),
        transaction_id: Set(None),
        ..Default::default()
    };
    let inserted = Order::insert(candidate)
        .on_conflict(OnConflict::new().do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    debug!(
        "Open order upsert for customer {} inserted {} row(s)",
        customer_id, inserted
    );

    find_open_order(db, customer_id)
        .await?
        .ok_or_else(|| Error::CustomerNotFound {
            identity: customer_id.to_string(),
        })
}

/// Lists a customer's completed orders, newest first.
pub async fn list_completed_orders<C>(db: &C, customer_id: i64) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .filter(order::Column::Complete.eq(true))
        .order_by_desc(order::Column::DateOrdered)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Generates a collision-resistant identifier for one checkout attempt.
#[must_use]
pub fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Stamps a fresh transaction identifier on an order and returns the updated order.
pub async fn stamp_transaction_id<C>(db: &C, order: order::Model) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    set_transaction_id(db, order, new_transaction_id()).await
}

/// Records a known transaction identifier on an open order.
///
/// # Errors
/// Returns `OrderAlreadyComplete` if the order was completed before.
pub async fn set_transaction_id<C>(
    db: &C,
    order: order::Model,
    transaction_id: String,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if order.complete {
        return Err(Error::OrderAlreadyComplete { order_id: order.id });
    }
    if order.transaction_id.as_deref() == Some(transaction_id.as_str()) {
        return Ok(order);
    }

    let mut active: order::ActiveModel = order.into();
    active.transaction_id = Set(Some(transaction_id));
    active.update(db).await.map_err(Into::into)
}

/// Marks an open order complete under the given transaction identifier.
///
/// # Errors
/// Returns `OrderAlreadyComplete` if the order was completed before.
pub async fn mark_complete<C>(
    db: &C,
    order: order::Model,
    transaction_id: String,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if order.complete {
        return Err(Error::OrderAlreadyComplete { order_id: order.id });
    }

    let mut active: order::ActiveModel = order.into();
    active.transaction_id = Set(Some(transaction_id));
    active.complete = Set(true);
    active.update(db).await.map_err(Into::into)
}
