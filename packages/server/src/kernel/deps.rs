//! Server dependencies for handlers and the pipeline (traits for testability)
//!
//! Central dependency container. Every external service sits behind a trait
//! so tests can swap in the mocks from `test_dependencies`.

use std::sync::Arc;

use crate::common::auth::HasAuthContext;
use crate::domains::auth::JwtService;
use crate::domains::leads::LeadJobStore;
use crate::kernel::{BasePlaceSearch, BaseSiteCrawler};

/// Dependencies shared by the HTTP handlers and the lead pipeline
#[derive(Clone)]
pub struct ServerDeps {
    /// Durable job store (Postgres in production, in-memory in tests)
    pub job_store: Arc<dyn LeadJobStore>,
    pub place_search: Arc<dyn BasePlaceSearch>,
    pub site_crawler: Arc<dyn BaseSiteCrawler>,
    /// JWT service for token verification
    pub jwt_service: Arc<JwtService>,
    /// Whether a real places API key was configured. When false, job starts
    /// are rejected up front instead of running an empty search.
    pub place_search_configured: bool,
    pub admin_identifiers: Vec<String>,
}

impl ServerDeps {
    pub fn new(
        job_store: Arc<dyn LeadJobStore>,
        place_search: Arc<dyn BasePlaceSearch>,
        site_crawler: Arc<dyn BaseSiteCrawler>,
        jwt_service: Arc<JwtService>,
        place_search_configured: bool,
        admin_identifiers: Vec<String>,
    ) -> Self {
        Self {
            job_store,
            place_search,
            site_crawler,
            jwt_service,
            place_search_configured,
            admin_identifiers,
        }
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
impl HasAuthContext for ServerDeps {
    fn admin_identifiers(&self) -> &[String] {
        &self.admin_identifiers
    }
}
