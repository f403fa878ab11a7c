//! Authentication module for Vendora
//!
//! Email/password accounts with bearer-token sessions:
//! - bcrypt-hashed credentials
//! - JWT access tokens carrying the user id and role
//! - `AuthUser` / `AdminUser` extractors for protected routes

mod extract;
mod jwt;
mod service;

pub use extract::{AdminUser, AuthUser};
pub use jwt::{generate_token, verify_token, Claims};
pub use service::AuthService;
