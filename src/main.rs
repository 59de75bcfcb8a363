use dotenvy::dotenv;
use std::sync::Arc;
use storefront::{
    config::{database, payment::PaymentCredentials, store},
    core::catalog,
    errors::Result,
    payment::HostedFormGateway,
    web::{self, AppState},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load store configuration
    let config = store::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;

    // 4. Connect and ensure the schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed the catalog
    let seeded = catalog::seed_products(&db, &config.products)
        .await
        .inspect_err(|e| error!("Failed to seed products: {}", e))?;
    info!("Seeded {} new product(s).", seeded);

    // 6. Payment gateway, keys come from the environment only
    let credentials = PaymentCredentials::from_env()
        .inspect_err(|e| error!("Payment credentials missing: {}", e))?;
    let gateway = HostedFormGateway::new(credentials, config.store.checkout_url.clone());

    // 7. Serve
    let bind_address = config.store.bind_address.clone();
    let state = AppState::new(db, config.store, Arc::new(gateway));
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Storefront listening on {}", bind_address);

    axum::serve(listener, web::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Storefront stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
