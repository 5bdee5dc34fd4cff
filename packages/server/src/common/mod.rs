// Shared building blocks used across domains
pub mod auth;

pub use auth::{Actor, AdminCapability, AuthError, HasAuthContext};
