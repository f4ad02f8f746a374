pub mod auth;
pub mod response;

pub use auth::{AdminUser, SessionUser};
pub use response::{ApiResponse, ApiResult};
