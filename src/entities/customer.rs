//! Customer entity - A shopper that owns orders.
//!
//! A customer is either linked to an authenticated principal through `user_id`
//! or created ad hoc from guest checkout contact details. Email is unique so
//! repeated guest checkouts resolve to the same row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Identifier of the authenticated principal, None for guests
    #[sea_orm(unique)]
    pub user_id: Option<String>,
    /// Display name, if one was given
    pub name: Option<String>,
    /// Contact email
    #[sea_orm(unique)]
    pub email: String,
    /// When the customer record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One customer has many shipping addresses
    #[sea_orm(has_many = "super::shipping_address::Entity")]
    ShippingAddresses,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::shipping_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingAddresses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
