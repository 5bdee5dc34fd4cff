// HTTP server layer
pub mod app;
pub mod middleware;
pub mod routes;

pub use app::{build_app, AppState};
