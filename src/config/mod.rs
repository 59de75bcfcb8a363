/// Database connection and table creation
pub mod database;

/// Payment gateway credentials from environment variables
pub mod payment;

/// Store settings and catalog seed loading from config.toml
pub mod store;
