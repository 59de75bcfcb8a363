//! Cart handlers.

use super::{
    AppState,
    extract::{GUEST_CART_HEADER, Shopper},
};
use crate::core::{
    cart::{self, CartAction, CartSummary},
    catalog, customer,
    guest::{self, GuestCartToken},
};
use crate::entities::product;
use crate::errors::Result;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Cart of whoever sent the request.
///
/// Never creates an order; a guest without a token has an empty cart.
pub(crate) async fn current_cart(state: &AppState, shopper: &Shopper) -> Result<CartSummary> {
    match shopper {
        Shopper::Account {
            customer: Some(customer),
            ..
        } => cart::cart_summary_for_customer(state.db(), customer.id).await,
        Shopper::Account { customer: None, .. } => Ok(CartSummary::empty()),
        Shopper::Guest(Some(token)) => {
            let snapshot = state.guest_carts().snapshot(token).await;
            guest::price_snapshot(state.db(), &snapshot).await
        }
        Shopper::Guest(None) => Ok(CartSummary::empty()),
    }
}

/// Resolves line image references against the media URL.
pub(crate) fn with_image_urls(mut summary: CartSummary, media_url: &str) -> CartSummary {
    for line in &mut summary.lines {
        line.image = line
            .image
            .as_deref()
            .and_then(|image| product::media_path(media_url, image));
    }
    summary
}

/// `GET /cart`
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>, shopper: Shopper) -> Result<Json<CartSummary>> {
    let summary = current_cart(&state, &shopper).await?;
    Ok(Json(with_image_urls(summary, &state.settings().media_url)))
}

/// Body of `POST /update_item`, e.g. `{"productId": 1, "action": "add"}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    product_id: i64,
    action: String,
}

/// Reply to `POST /update_item`.
#[derive(Debug, Serialize)]
pub struct UpdateItemResponse {
    message: &'static str,
    quantity: i32,
    cart_items: i64,
}

/// `POST /update_item`
///
/// Guests without a cart token get one in the `x-guest-cart` response header.
#[instrument(skip_all)]
pub async fn update_item(
    State(state): State<AppState>,
    shopper: Shopper,
    payload: std::result::Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;
    let action: CartAction = request.action.parse()?;
    debug!("{:?} product {}", action, request.product_id);

    match shopper {
        Shopper::Account { principal, .. } => {
            let customer = customer::resolve_account(state.db(), &principal).await?;
            let item =
                cart::add_or_remove_item(state.db(), customer.id, request.product_id, action)
                    .await?;
            let summary = cart::cart_summary_for_customer(state.db(), customer.id).await?;
            Ok(Json(UpdateItemResponse {
                message: "Item was added",
                quantity: item.map_or(0, |item| item.quantity),
                cart_items: summary.item_count,
            })
            .into_response())
        }
        Shopper::Guest(token) => {
            catalog::require_product(state.db(), request.product_id).await?;
            let token = token.unwrap_or_else(GuestCartToken::new);
            let quantity = state
                .guest_carts()
                .apply(token, request.product_id, action)
                .await;
            let snapshot = state.guest_carts().snapshot(&token).await;
            let summary = guest::price_snapshot(state.db(), &snapshot).await?;
            Ok((
                [(GUEST_CART_HEADER, token.to_string())],
                Json(UpdateItemResponse {
                    message: "Item was added",
                    quantity,
                    cart_items: summary.item_count,
                }),
            )
                .into_response())
        }
    }
}
