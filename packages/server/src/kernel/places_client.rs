//! Places text-search API client (Google Places v1 wire format).
//!
//! One method: `search(query, page_size, page_token)`. Upstream failures are
//! absorbed into an empty page so one bad response never fails a whole job.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{BasePlaceSearch, Place, PlacePage};

const DEFAULT_ENDPOINT: &str = "https://places.googleapis.com/v1/places:searchText";
const FIELD_MASK: &str = "places.id,places.displayName,places.websiteUri,nextPageToken";

/// Client for the paginated places text-search API
pub struct PlacesClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

/// Text-search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    page_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

/// Text-search response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<ApiPlace>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlace {
    id: String,
    #[serde(default)]
    display_name: Option<LocalizedText>,
    #[serde(default)]
    website_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

impl PlacesClient {
    /// Create a new places client
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        })
    }

    /// Point the client at a different endpoint (tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl BasePlaceSearch for PlacesClient {
    async fn search(
        &self,
        query: &str,
        page_size: i32,
        page_token: Option<&str>,
    ) -> Result<PlacePage> {
        let request = SearchTextRequest {
            text_query: query,
            page_size,
            page_token,
        };

        let response = match self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(query = %query, error = %e, "Places search request failed");
                return Ok(PlacePage::default());
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(query = %query, status = %status, body = %body, "Places API error");
            return Ok(PlacePage::default());
        }

        let parsed: SearchTextResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(query = %query, error = %e, "Failed to parse places response");
                return Ok(PlacePage::default());
            }
        };

        let places = parsed
            .places
            .into_iter()
            .map(|p| Place {
                id: p.id,
                display_name: p.display_name.map(|n| n.text).unwrap_or_default(),
                website_uri: p.website_uri.filter(|w| !w.is_empty()),
            })
            .collect();

        Ok(PlacePage {
            places,
            next_page_token: parsed.next_page_token.filter(|t| !t.is_empty()),
        })
    }
}

/// No-op place search for when no API key is configured
pub struct NoopPlaceSearch;

#[async_trait]
impl BasePlaceSearch for NoopPlaceSearch {
    async fn search(
        &self,
        _query: &str,
        _page_size: i32,
        _page_token: Option<&str>,
    ) -> Result<PlacePage> {
        warn!("NoopPlaceSearch: search called but no places API key configured");
        Ok(PlacePage::default())
    }
}
