pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError, Verification};
pub use session::{cookie_key, Session, SessionCookies};
