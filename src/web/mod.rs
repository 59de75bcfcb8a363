//! JSON HTTP interface over the storefront core.
//!
//! Handlers stay thin: they extract the shopper, call into [`crate::core`], and map
//! errors to status codes through [`crate::errors::Error`]'s `IntoResponse` impl.

/// Cart handlers
pub mod cart;
/// Checkout handlers
pub mod checkout;
/// Error to HTTP response mapping
pub mod error;
/// Shopper identity extraction
pub mod extract;
/// Catalog handlers
pub mod products;

use crate::config::store::StoreSettings;
use crate::core::guest::GuestCarts;
use crate::payment::PaymentGateway;
use axum::{
    Json, Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: DatabaseConnection,
    settings: StoreSettings,
    guest_carts: GuestCarts,
    gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Creates the state, sizing the guest cart store from `settings`.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        settings: StoreSettings,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let guest_carts = GuestCarts::new(
            Duration::from_secs(settings.guest_cart_ttl_secs),
            settings.guest_cart_capacity,
        );
        Self {
            inner: Arc::new(AppStateInner {
                db,
                settings,
                guest_carts,
                gateway,
            }),
        }
    }

    /// Database connection.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.inner.db
    }

    /// Store settings.
    #[must_use]
    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    /// Guest cart store.
    #[must_use]
    pub fn guest_carts(&self) -> &GuestCarts {
        &self.inner.guest_carts
    }

    /// Payment gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the storefront router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/cart", get(cart::show))
        .route("/update_item", post(cart::update_item))
        .route("/checkout", get(checkout::show))
        .route("/process_order", post(checkout::process_order))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::payment::PaymentCredentials;
    use crate::core::guest::GuestCartToken;
    use crate::entities::{Customer, Order, ShippingAddress, product};
    use crate::errors::Result;
    use crate::payment::HostedFormGateway;
    use crate::test_utils::*;
    use axum::body::Body;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use axum::http::{Request, Response, StatusCode, header};
    use rust_decimal::Decimal;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
        physical: product::Model,
        digital: product::Model,
    }

    async fn test_app() -> Result<TestApp> {
        let (db, _customer, physical, digital) = setup_with_customer_and_products().await?;
        let gateway = HostedFormGateway::new(
            PaymentCredentials {
                public_key: "sandbox_12345".to_string(),
                private_key: "sandbox_54321".to_string(),
            },
            "https://www.liqpay.ua/api/3/checkout".to_string(),
        );
        let state = AppState::new(db, StoreSettings::default(), Arc::new(gateway));
        Ok(TestApp {
            router: router(state.clone()),
            state,
            physical,
            digital,
        })
    }

    fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, headers: &[(&str, &str)], body: &Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
        app.router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    /// Transaction id the payment form was signed for.
    fn handoff_order_id(checkout: &Value) -> Value {
        let data = checkout["payment"]["fields"]["data"].as_str().unwrap();
        let payload: Value = serde_json::from_slice(&STANDARD.decode(data).unwrap()).unwrap();
        payload["order_id"].clone()
    }

    const SHOPPER: [(&str, &str); 3] = [
        ("x-user-id", "user-42"),
        ("x-user-email", "dana@example.com"),
        ("x-user-name", "Dana"),
    ];

    fn update(product_id: i64, action: &str) -> Value {
        json!({ "productId": product_id, "action": action })
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let app = test_app().await?;
        let response = send(&app, get("/health", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_product_listing_and_detail() -> Result<()> {
        let app = test_app().await?;

        let response = send(&app, get("/products", &[])).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["products"].as_array().unwrap().len(), 2);
        assert_eq!(body["products"][0]["name"], "Headphones");
        assert_eq!(decimal(&body["products"][0]["price"]), Decimal::new(10, 0));
        assert_eq!(body["cart_items"], 0);

        let uri = format!("/products/{}", app.digital.id);
        let body = json_body(send(&app, get(&uri, &[])).await).await;
        assert_eq!(body["product"]["digital"], true);

        let response = send(&app, get("/products/999", &[])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["error"].is_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_customer_cart_and_checkout() -> Result<()> {
        let app = test_app().await?;

        for _ in 0..2 {
            let response = send(
                &app,
                post_json("/update_item", &SHOPPER, &update(app.physical.id, "add")),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let body = json_body(
            send(
                &app,
                post_json("/update_item", &SHOPPER, &update(app.digital.id, "add")),
            )
            .await,
        )
        .await;
        assert_eq!(body["message"], "Item was added");
        assert_eq!(body["quantity"], 1);
        assert_eq!(body["cart_items"], 3);

        let cart = json_body(send(&app, get("/cart", &SHOPPER)).await).await;
        assert_eq!(decimal(&cart["total"]), Decimal::new(25, 0));
        assert_eq!(cart["requires_shipping"], true);

        let checkout = json_body(send(&app, get("/checkout", &SHOPPER)).await).await;
        assert_eq!(checkout["payment"]["kind"], "form");
        assert!(checkout["payment"]["fields"]["signature"].is_string());

        // Wrong total is rejected and the order stays open
        let body = json!({
            "form": { "total": "24.00" },
            "shipping": { "address": "1 Main St", "city": "Kyiv", "state": "", "zipcode": "01001" }
        });
        let response = send(&app, post_json("/process_order", &SHOPPER, &body)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json!({
            "form": { "total": 25.0 },
            "shipping": { "address": "1 Main St", "city": "Kyiv", "state": "", "zipcode": "01001" }
        });
        let response = send(&app, post_json("/process_order", &SHOPPER, &body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = json_body(response).await;
        assert_eq!(receipt["message"], "Payment complete!");
        assert!(receipt["transaction_id"].is_string());

        // The cart is empty afterwards
        let cart = json_body(send(&app, get("/cart", &SHOPPER)).await).await;
        assert_eq!(cart["item_count"], 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_cart_and_checkout() -> Result<()> {
        let app = test_app().await?;

        let response = send(
            &app,
            post_json("/update_item", &[], &update(app.physical.id, "add")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = response
            .headers()
            .get("x-guest-cart")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(token.parse::<GuestCartToken>().is_ok());

        let guest = [("x-guest-cart", token.as_str())];
        let body = json_body(
            send(
                &app,
                post_json("/update_item", &guest, &update(app.physical.id, "add")),
            )
            .await,
        )
        .await;
        assert_eq!(body["quantity"], 2);
        assert_eq!(body["cart_items"], 2);

        // Guest carts live outside the database until checkout
        assert_eq!(Order::find().count(app.state.db()).await?, 0);

        let body = json!({
            "form": { "total": "20.00", "name": "Alex", "email": "a@b.com" },
            "shipping": { "address": "", "city": "", "state": "", "zipcode": "" }
        });
        let response = send(&app, post_json("/process_order", &guest, &body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let cart = json_body(send(&app, get("/cart", &guest)).await).await;
        assert_eq!(cart["item_count"], 0);

        // Empty shipping fields are accepted
        assert_eq!(ShippingAddress::find().count(app.state.db()).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_checkout_needs_contact_details() -> Result<()> {
        let app = test_app().await?;
        let body = json!({ "form": { "total": "0" } });
        let response = send(&app, post_json("/process_order", &[], &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_update_requests() -> Result<()> {
        let app = test_app().await?;

        let response = send(
            &app,
            post_json("/update_item", &SHOPPER, &update(app.physical.id, "explode")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            json_body(response).await["error"]
                .as_str()
                .unwrap()
                .contains("explode")
        );

        let response = send(
            &app,
            post_json("/update_item", &SHOPPER, &json!({ "action": "add" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            post_json("/update_item", &SHOPPER, &update(999, "add")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            get("/cart", &[("x-guest-cart", "not-a-token")]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn test_payment_form_is_signed_for_the_completed_transaction() -> Result<()> {
        let app = test_app().await?;
        let shipping = json!({ "address": "1 Main St", "city": "Kyiv", "state": "", "zipcode": "01001" });

        // Account
        send(
            &app,
            post_json("/update_item", &SHOPPER, &update(app.physical.id, "add")),
        )
        .await;
        let checkout = json_body(send(&app, get("/checkout", &SHOPPER)).await).await;
        let signed_for = handoff_order_id(&checkout);
        let body = json!({ "form": { "total": "10.00" }, "shipping": shipping });
        let receipt = json_body(send(&app, post_json("/process_order", &SHOPPER, &body)).await).await;
        assert_eq!(receipt["transaction_id"], signed_for);

        // Guest
        let response = send(
            &app,
            post_json("/update_item", &[], &update(app.digital.id, "add")),
        )
        .await;
        let token = response
            .headers()
            .get("x-guest-cart")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let guest = [("x-guest-cart", token.as_str())];
        let checkout = json_body(send(&app, get("/checkout", &guest)).await).await;
        let signed_for = handoff_order_id(&checkout);
        let body = json!({ "form": { "total": "5.00", "name": "Alex", "email": "a@b.com" } });
        let receipt = json_body(send(&app, post_json("/process_order", &guest, &body)).await).await;
        assert_eq!(receipt["transaction_id"], signed_for);

        Ok(())
    }

    #[tokio::test]
    async fn test_browsing_does_not_create_customers() -> Result<()> {
        let app = test_app().await?;
        let before = Customer::find().count(app.state.db()).await?;

        for uri in ["/products", "/cart", "/checkout"] {
            let response = send(&app, get(uri, &SHOPPER)).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(Customer::find().count(app.state.db()).await?, before);

        // The first cart change links the account
        send(
            &app,
            post_json("/update_item", &SHOPPER, &update(app.physical.id, "add")),
        )
        .await;
        assert_eq!(Customer::find().count(app.state.db()).await?, before + 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_checkout_with_registered_email_is_rejected() -> Result<()> {
        let app = test_app().await?;
        send(
            &app,
            post_json("/update_item", &SHOPPER, &update(app.physical.id, "add")),
        )
        .await;

        let response = send(
            &app,
            post_json("/update_item", &[], &update(app.digital.id, "add")),
        )
        .await;
        let token = response
            .headers()
            .get("x-guest-cart")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let guest = [("x-guest-cart", token.as_str())];
        let body = json!({ "form": { "total": "5.00", "name": "Eve", "email": "dana@example.com" } });
        let response = send(&app, post_json("/process_order", &guest, &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The account's cart is untouched
        let cart = json_body(send(&app, get("/cart", &SHOPPER)).await).await;
        assert_eq!(cart["item_count"], 1);
        assert_eq!(decimal(&cart["total"]), Decimal::new(10, 0));

        Ok(())
    }
}
