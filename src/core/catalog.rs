//! Catalog business logic - Handles product lookups and catalog maintenance.
//!
//! Products are read-only reference data from the cart's point of view. This module
//! provides listing and lookup for the storefront pages, validated creation, seeding
//! from configuration, and removal. Removing a product keeps the order items that
//! referenced it; their product reference becomes NULL and they count as zero in totals.

use crate::{
    config::store::ProductConfig,
    core::money,
    entities::{OrderItem, Product, order_item, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Fields required to create a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Unit price in the store currency
    pub price: Decimal,
    /// Digital delivery flag; None is treated as physical
    pub digital: Option<bool>,
    /// Optional image path
    pub image: Option<String>,
    /// Free-text description
    pub description: String,
}

impl From<ProductConfig> for NewProduct {
    fn from(config: ProductConfig) -> Self {
        Self {
            name: config.name,
            price: config.price,
            digital: config.digital,
            image: config.image,
            description: config.description,
        }
    }
}

/// Retrieves every product in catalog order (by id).
pub async fn list_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID, returning None if it does not exist.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by ID, failing with `ProductNotFound` if it does not exist.
pub async fn require_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    get_product_by_id(db, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })
}

/// Finds a product by its exact name.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product after validating its name and price.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or has more than two decimal places
/// - The database insert operation fails
pub async fn create_product<C>(db: &C, new_product: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = new_product.name.trim();
    if name.is_empty() {
        return Err(Error::invalid_input("Product name cannot be empty"));
    }
    let price_minor = money::to_minor_units(new_product.price)?;

    let product = product::ActiveModel {
        name: Set(name.to_string()),
        price_minor: Set(price_minor),
        digital: Set(new_product.digital),
        image: Set(new_product.image.filter(|image| !image.trim().is_empty())),
        description: Set(new_product.description),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Inserts configured products whose names are not in the catalog yet.
///
/// Returns the number of products created.
pub async fn seed_products(db: &DatabaseConnection, products: &[ProductConfig]) -> Result<usize> {
    let txn = db.begin().await?;
    let mut created = 0;

    for config in products {
        if get_product_by_name(&txn, config.name.trim()).await?.is_some() {
            debug!("Product '{}' already in catalog, skipping", config.name);
            continue;
        }
        create_product(&txn, NewProduct::from(config.clone())).await?;
        created += 1;
    }

    txn.commit().await?;
    info!("Seeded {} of {} configured products", created, products.len());
    Ok(created)
}

/// Removes a product from the catalog.
///
/// Order items that referenced the product are kept with a NULL product reference,
/// so historical orders survive and open carts simply stop counting that line.
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let product = require_product(&txn, product_id).await?;

    OrderItem::update_many()
        .col_expr(
            order_item::Column::ProductId,
            Expr::value(Option::<i64>::None),
        )
        .filter(order_item::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;

    product.delete(&txn).await?;
    txn.commit().await?;

    info!("Removed product {} from catalog", product_id);
    Ok(())
}
