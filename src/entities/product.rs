//! Product entity - Catalog items customers can put in their cart.
//!
//! Prices are stored in minor currency units so that cart totals are exact.
//! The `digital` flag is tri-state in storage; an unset flag means physical.

use crate::core::money;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Headphones", "E-book")
    pub name: String,
    /// Unit price in minor currency units (e.g., cents)
    pub price_minor: i64,
    /// Whether the product is delivered digitally; None is treated as false
    pub digital: Option<bool>,
    /// Optional image path, relative to the configured media URL
    pub image: Option<String>,
    /// Free-text description
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

impl Model {
    /// Unit price as a decimal amount in the store currency.
    #[must_use]
    pub fn price(&self) -> Decimal {
        money::from_minor_units(self.price_minor)
    }

    /// Whether the product ships digitally. An unset flag counts as physical.
    #[must_use]
    pub const fn is_digital(&self) -> bool {
        matches!(self.digital, Some(true))
    }

    /// Public URL of the product image, or None when the product has no image.
    #[must_use]
    pub fn image_url(&self, media_url: &str) -> Option<String> {
        media_path(media_url, self.image.as_deref()?)
    }
}

/// Joins an image reference onto the media URL with exactly one slash.
///
/// Returns None for a blank reference.
#[must_use]
pub fn media_path(media_url: &str, image: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
        return None;
    }
    Some(format!(
        "{}/{}",
        media_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    ))
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears in many order items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
