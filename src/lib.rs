//! `Storefront` - An e-commerce storefront backend
//!
//! This crate provides product browsing, per-customer and guest carts, order checkout with
//! exact total reconciliation, and a hosted payment form hand-off, served as a JSON API.

#![deny(
    unsafe_code,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    // Handlers and core code propagate errors instead of panicking
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::dbg_macro,
    // Money is Decimal; floats only appear in tests
    clippy::float_cmp,
    clippy::clone_on_ref_ptr,
    clippy::needless_pass_by_value,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

// `missing_docs` stays a warning: `DeriveEntityModel` output carries no docs.

/// Configuration management for database, store settings, and payment keys
pub mod config;
/// Core business logic - catalog, cart, guest, and checkout operations
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Payment gateway abstraction and hosted form implementation
pub mod payment;
/// JSON HTTP API
pub mod web;

#[cfg(test)]
pub mod test_utils;
