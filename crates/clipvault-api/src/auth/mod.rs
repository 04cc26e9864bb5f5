//! Authentication: JWT bearer tokens and argon2 password hashing.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::JwtService;
pub use models::AuthContext;
