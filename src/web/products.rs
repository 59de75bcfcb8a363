//! Catalog handlers.

use super::{AppState, cart::current_cart, extract::Shopper};
use crate::core::catalog;
use crate::entities::product;
use crate::errors::Result;
use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

/// A product as shown to shoppers.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    /// Product id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Delivered digitally, no shipping needed
    pub digital: bool,
    /// Image URL under the media URL, if the product has an image
    pub image_url: Option<String>,
    /// Free-text description
    pub description: String,
}

impl ProductView {
    fn new(product: &product::Model, media_url: &str) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price(),
            digital: product.is_digital(),
            image_url: product.image_url(media_url),
            description: product.description.clone(),
        }
    }
}

/// Body of `GET /products`.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    products: Vec<ProductView>,
    cart_items: i64,
}

/// Body of `GET /products/{id}`.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    product: ProductView,
    cart_items: i64,
}

/// `GET /products`
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, shopper: Shopper) -> Result<Json<ProductListResponse>> {
    let media_url = &state.settings().media_url;
    let products = catalog::list_products(state.db())
        .await?
        .iter()
        .map(|product| ProductView::new(product, media_url))
        .collect();
    let cart_items = current_cart(&state, &shopper).await?.item_count;

    Ok(Json(ProductListResponse {
        products,
        cart_items,
    }))
}

/// `GET /products/{id}`
#[instrument(skip(state, shopper))]
pub async fn show(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>> {
    let product = catalog::require_product(state.db(), id).await?;
    let cart_items = current_cart(&state, &shopper).await?.item_count;

    Ok(Json(ProductResponse {
        product: ProductView::new(&product, &state.settings().media_url),
        cart_items,
    }))
}
