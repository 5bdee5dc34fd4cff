// LeadScout - API Core
//
// This crate provides the backend for the lead discovery pipeline: paginated
// place search, bounded contact crawling, per-job aggregation, and CSV export.
// The wider SaaS surface (campaigns, billing, dashboards) lives elsewhere and
// talks to this service over HTTP.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
