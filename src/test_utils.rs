//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewProduct},
        customer,
    },
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a physical test product with the given price.
///
/// # Defaults
/// * `digital`: Some(false)
/// * `image`: None
/// * `description`: "Test product"
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            price,
            digital: Some(false),
            image: None,
            description: "Test product".to_string(),
        },
    )
    .await
}

/// Creates a digitally delivered test product with the given price.
pub async fn create_digital_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            price,
            digital: Some(true),
            image: None,
            description: "Test download".to_string(),
        },
    )
    .await
}

/// Sets up a test environment with one registered customer.
/// Returns (db, customer) for order and cart tests.
pub async fn setup_with_customer() -> Result<(DatabaseConnection, entities::customer::Model)> {
    let db = setup_test_db().await?;
    let customer = customer::create_customer(
        &db,
        Some("test_user".to_string()),
        Some("Test Shopper"),
        "shopper@example.com",
    )
    .await?;
    Ok((db, customer))
}

/// Sets up a customer plus a physical product (10.00) and a digital product (5.00).
/// Returns (db, customer, physical, digital).
pub async fn setup_with_customer_and_products() -> Result<(
    DatabaseConnection,
    entities::customer::Model,
    entities::product::Model,
    entities::product::Model,
)> {
    let (db, customer) = setup_with_customer().await?;
    let physical = create_test_product(&db, "Headphones", Decimal::new(1000, 2)).await?;
    let digital = create_digital_product(&db, "E-book", Decimal::new(500, 2)).await?;
    Ok((db, customer, physical, digital))
}
