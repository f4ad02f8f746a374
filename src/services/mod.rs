pub mod product_service;
pub mod sales_service;
pub mod user_service;

pub use product_service::{NewProduct, ProductService, ProductUpdate};
pub use sales_service::{OrderItem, Receipt, SalesQuery, SalesService, SalesSummary};
pub use user_service::{NewUser, UserService, UserUpdate};

use crate::auth::PasswordError;
use crate::sheets::SheetsError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Spreadsheet error: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not enough stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },
}
