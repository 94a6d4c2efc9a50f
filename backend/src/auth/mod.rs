//! Authentication module
//!
//! JWT-based access/refresh tokens with argon2 password hashing, and the
//! request-authentication gate that protects handlers.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TokenError};
pub use middleware::{CurrentUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use password::PasswordService;
