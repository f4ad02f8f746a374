pub mod product;
pub mod sales;
pub mod sheets;
pub mod user;
