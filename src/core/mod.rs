//! Core business logic, independent of the HTTP layer.
//!
//! Functions take any `sea_orm::ConnectionTrait` where they can, so callers decide
//! whether an operation runs on its own or inside a larger transaction.

/// Cart contents, quantity changes, and derived values
pub mod cart;

/// Product catalog queries, creation, and seeding
pub mod catalog;

/// Order finalization and shipping capture
pub mod checkout;

/// Customer resolution for authenticated and guest shoppers
pub mod customer;

/// Token-keyed guest carts and guest order adoption
pub mod guest;

/// Conversion between decimal prices and stored minor units
pub mod money;

/// Open order resolution and order state transitions
pub mod order;
