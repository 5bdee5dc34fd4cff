// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "aggregate leads under a cap") lives in domain
// functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BasePlaceSearch)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// Place Search Trait (Infrastructure - paginated text search)
// =============================================================================

/// One candidate business returned by the places API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub display_name: String,
    /// Absolute URL of the business website, if the API knows one
    pub website_uri: Option<String>,
}

/// One page of search results plus the cursor for the next page
#[derive(Debug, Clone, Default)]
pub struct PlacePage {
    pub places: Vec<Place>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait BasePlaceSearch: Send + Sync {
    /// Run a text search ("cafe in Stockholm") for one page of places.
    ///
    /// A missing `page_token` requests the first page. A non-success upstream
    /// response yields an empty page; an `Err` is reserved for transport-level
    /// failures and callers degrade it to an empty page as well.
    async fn search(
        &self,
        query: &str,
        page_size: i32,
        page_token: Option<&str>,
    ) -> Result<PlacePage>;
}

// =============================================================================
// Site Crawler Trait (Infrastructure - contact page probing)
// =============================================================================

#[async_trait]
pub trait BaseSiteCrawler: Send + Sync {
    /// Probe a website's likely contact pages and return every business
    /// email found, deduplicated. Unreachable sites and failed paths
    /// degrade to an empty set; this never errors.
    async fn crawl(&self, website_url: &str) -> BTreeSet<String>;
}
