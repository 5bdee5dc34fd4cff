//! Contact crawler - probes a fixed set of likely contact pages per website.
//!
//! This is deliberately not a link-following crawler: each candidate site
//! gets at most `PROBE_PATHS.len()` GET requests, each under a hard timeout,
//! with a politeness delay in between. Every failure is contained to the
//! path it happened on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{BaseSiteCrawler, EmailExtractor};

/// Relative paths probed on every candidate website, in order.
const PROBE_PATHS: &[&str] = &["/", "/contact", "/kontakt", "/om-oss", "/about", "/about-us"];

/// Identifying user agent so site operators can see who is probing them.
const USER_AGENT: &str = "LeadScoutBot/1.0 (+https://leadscout.app/bot)";

/// Tuning knobs for the crawler. Defaults are production values; tests zero
/// the delay.
#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Politeness delay between successive path probes on the same site
    pub path_delay: Duration,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            path_delay: Duration::from_millis(500),
        }
    }
}

/// Crawler that harvests contact emails from a website's standard pages
pub struct ContactCrawler {
    client: reqwest::Client,
    extractor: EmailExtractor,
    options: CrawlerOptions,
}

impl ContactCrawler {
    pub fn new(extractor: EmailExtractor, options: CrawlerOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            extractor,
            options,
        })
    }

    /// Normalize URL by adding https:// if no scheme is present
    fn normalize_url(url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }

    /// Fetch one probe path; Ok(None) means "skip this path".
    async fn fetch_path(&self, base: &Url, probe_path: &str) -> Option<String> {
        let mut target = base.clone();
        target.set_path(probe_path);
        target.set_query(None);
        target.set_fragment(None);

        debug!(url = %target, "Probing contact path");

        let response = match self.client.get(target.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %target, error = %e, "Probe request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %target, status = %response.status(), "Probe returned non-success");
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = %target, error = %e, "Failed to read probe body");
                None
            }
        }
    }
}

#[async_trait]
impl BaseSiteCrawler for ContactCrawler {
    async fn crawl(&self, website_url: &str) -> BTreeSet<String> {
        let normalized = Self::normalize_url(website_url);
        let base = match Url::parse(&normalized) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %website_url, error = %e, "Unparseable website URL, skipping site");
                return BTreeSet::new();
            }
        };

        let mut emails = BTreeSet::new();

        for (i, probe_path) in PROBE_PATHS.iter().enumerate() {
            if i > 0 && !self.options.path_delay.is_zero() {
                tokio::time::sleep(self.options.path_delay).await;
            }

            if let Some(html) = self.fetch_path(&base, probe_path).await {
                emails.extend(self.extractor.extract(&html));
            }
        }

        debug!(url = %website_url, emails_found = emails.len(), "Site crawl finished");
        emails
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_crawler() -> ContactCrawler {
        ContactCrawler::new(
            EmailExtractor::default(),
            CrawlerOptions {
                request_timeout: Duration::from_secs(5),
                path_delay: Duration::ZERO,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            ContactCrawler::normalize_url("example.com"),
            "https://example.com"
        );
        assert_eq!(
            ContactCrawler::normalize_url("http://example.com"),
            "http://example.com"
        );
    }

    #[tokio::test]
    async fn test_same_email_across_paths_collapses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("Write info@kafe-ett.se anytime"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<a href="mailto:info@kafe-ett.se">mail</a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let emails = test_crawler().crawl(&server.uri()).await;
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("info@kafe-ett.se"));
    }

    #[tokio::test]
    async fn test_failed_path_does_not_sink_the_crawl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ceo@firma.no"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let emails = test_crawler().crawl(&server.uri()).await;
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("ceo@firma.no"));
    }

    #[tokio::test]
    async fn test_unreachable_site_yields_empty_set() {
        // Reserved TEST-NET address, nothing listens there.
        let crawler = ContactCrawler::new(
            EmailExtractor::default(),
            CrawlerOptions {
                request_timeout: Duration::from_millis(200),
                path_delay: Duration::ZERO,
            },
        )
        .unwrap();

        let emails = crawler.crawl("http://192.0.2.1:9").await;
        assert!(emails.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_url_yields_empty_set() {
        let emails = test_crawler().crawl("http://").await;
        assert!(emails.is_empty());
    }
}
