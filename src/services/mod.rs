pub mod account;
pub mod jwt;
pub mod password;

pub use account::{normalize_email, seed_admin};
pub use jwt::JwtService;
pub use password::PasswordService;
