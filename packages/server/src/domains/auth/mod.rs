// Authentication domain: verified JWT identity resolution.
pub mod jwt;

pub use jwt::{Claims, JwtService};
