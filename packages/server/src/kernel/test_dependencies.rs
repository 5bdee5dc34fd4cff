// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use super::{BasePlaceSearch, BaseSiteCrawler, Place, PlacePage};

// =============================================================================
// Mock Place Search
// =============================================================================

/// Arguments captured from a search call
#[derive(Debug, Clone)]
pub struct SearchCallArgs {
    pub query: String,
    pub page_size: i32,
    pub page_token: Option<String>,
}

/// Scripted place search: pages are returned per query, in order.
#[derive(Default)]
pub struct MockPlaceSearch {
    pages: Mutex<HashMap<String, Vec<PlacePage>>>,
    failing_queries: Mutex<Vec<String>>,
    calls: Arc<Mutex<Vec<SearchCallArgs>>>,
}

impl MockPlaceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one result page for a query. Queue several to script pagination.
    pub fn with_page(self, query: &str, page: PlacePage) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push(page);
        self
    }

    /// Make every search for this query return an error.
    pub fn with_failing_query(self, query: &str) -> Self {
        self.failing_queries.lock().unwrap().push(query.to_string());
        self
    }

    /// All search calls with their arguments
    pub fn calls(&self) -> Vec<SearchCallArgs> {
        self.calls.lock().unwrap().clone()
    }
}

/// Build a page of places from (name, website) pairs
pub fn place_page(entries: &[(&str, Option<&str>)], next_page_token: Option<&str>) -> PlacePage {
    PlacePage {
        places: entries
            .iter()
            .enumerate()
            .map(|(i, (name, website))| Place {
                id: format!("place-{}-{}", name.to_lowercase().replace(' ', "-"), i),
                display_name: name.to_string(),
                website_uri: website.map(|w| w.to_string()),
            })
            .collect(),
        next_page_token: next_page_token.map(|t| t.to_string()),
    }
}

#[async_trait]
impl BasePlaceSearch for MockPlaceSearch {
    async fn search(
        &self,
        query: &str,
        page_size: i32,
        page_token: Option<&str>,
    ) -> Result<PlacePage> {
        self.calls.lock().unwrap().push(SearchCallArgs {
            query: query.to_string(),
            page_size,
            page_token: page_token.map(|t| t.to_string()),
        });

        if self
            .failing_queries
            .lock()
            .unwrap()
            .iter()
            .any(|q| q == query)
        {
            anyhow::bail!("mock search failure for {query}");
        }

        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .get_mut(query)
            .and_then(|queue| {
                if queue.is_empty() {
                    None
                } else {
                    Some(queue.remove(0))
                }
            })
            .unwrap_or_default();
        Ok(page)
    }
}

// =============================================================================
// Mock Site Crawler
// =============================================================================

/// Scripted crawler: emails are returned per website URL.
#[derive(Default)]
pub struct MockSiteCrawler {
    emails_by_site: Mutex<HashMap<String, BTreeSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSiteCrawler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the emails a site's crawl will yield.
    pub fn with_site(self, website_url: &str, emails: &[&str]) -> Self {
        self.emails_by_site.lock().unwrap().insert(
            website_url.to_string(),
            emails.iter().map(|e| e.to_string()).collect(),
        );
        self
    }

    /// All crawled website URLs, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Check if a website was crawled
    pub fn was_crawled(&self, website_url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|u| u == website_url)
    }
}

#[async_trait]
impl BaseSiteCrawler for MockSiteCrawler {
    async fn crawl(&self, website_url: &str) -> BTreeSet<String> {
        self.calls.lock().unwrap().push(website_url.to_string());
        self.emails_by_site
            .lock()
            .unwrap()
            .get(website_url)
            .cloned()
            .unwrap_or_default()
    }
}
