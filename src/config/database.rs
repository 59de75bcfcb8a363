//! Database configuration module for the storefront.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. On top of the generated tables it creates
//! the unique indexes the cart relies on:
//!
//! - one incomplete order per customer (a partial unique index)
//! - one order item per (order, product)

use crate::entities::{Customer, Order, OrderItem, Product, ShippingAddress, order_item};
use crate::errors::Result;
use sea_orm::sea_query::{Index, TableCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Partial unique index backing the "single open order per customer" invariant.
const OPEN_ORDER_INDEX_SQL: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_one_open_per_customer \
     ON orders (customer_id) WHERE NOT complete";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Tables are created parents first so foreign keys resolve: customers and products,
/// then orders, then order items and shipping addresses.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables: [TableCreateStatement; 5] = [
        schema.create_table_from_entity(Customer),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
        schema.create_table_from_entity(ShippingAddress),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    let order_item_index = Index::create()
        .name("idx_order_items_order_product")
        .table(OrderItem)
        .col(order_item::Column::OrderId)
        .col(order_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&order_item_index)).await?;
    db.execute_unprepared(OPEN_ORDER_INDEX_SQL).await?;

    info!("Database tables and indexes ensured.");
    Ok(())
}
