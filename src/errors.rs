use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("Customer not found: {identity}")]
    CustomerNotFound { identity: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Unknown cart action: {action}")]
    UnknownCartAction { action: String },

    #[error("Submitted total {submitted} does not match cart total {expected}")]
    TotalMismatch { submitted: Decimal, expected: Decimal },

    #[error("Order {order_id} is already complete")]
    OrderAlreadyComplete { order_id: i64 },

    #[error("Payment gateway error: {message}")]
    Payment { message: String },
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
