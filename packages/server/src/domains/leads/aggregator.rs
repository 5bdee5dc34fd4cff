//! Per-(city, category) lead aggregation under a result cap.

use tracing::debug;

use crate::kernel::{BaseSiteCrawler, Place};

use super::model::Lead;

/// Accumulates leads for one (city, category) pair.
///
/// Cap accounting: every emitted lead consumes one unit, whether it carries
/// an email or not. Websiteless places are skipped entirely and consume
/// nothing.
pub struct ResultAggregator {
    city: String,
    category: String,
    cap: usize,
    leads: Vec<Lead>,
}

impl ResultAggregator {
    pub fn new(city: &str, category: &str, cap: usize) -> Self {
        Self {
            city: city.to_string(),
            category: category.to_string(),
            cap,
            leads: Vec::new(),
        }
    }

    /// Units of the cap still available
    pub fn cap_remaining(&self) -> usize {
        self.cap.saturating_sub(self.leads.len())
    }

    pub fn is_full(&self) -> bool {
        self.cap_remaining() == 0
    }

    /// Consider one candidate place. Crawls its website (if any) and emits
    /// leads: one per distinct email, or a single empty-email lead when the
    /// crawl came back dry. Must not be called once the aggregator is full;
    /// the pipeline checks `is_full` before every candidate so capped pairs
    /// never crawl another site.
    pub async fn consume(&mut self, place: &Place, crawler: &dyn BaseSiteCrawler) {
        let Some(website) = place.website_uri.as_deref() else {
            debug!(business = %place.display_name, "Skipping place without website");
            return;
        };

        let emails = crawler.crawl(website).await;

        if emails.is_empty() {
            // Keep the business visible as "found, but unreachable".
            self.push_lead(&place.display_name, website, "");
            return;
        }

        for email in emails {
            if self.is_full() {
                break;
            }
            self.push_lead(&place.display_name, website, &email);
        }
    }

    fn push_lead(&mut self, business_name: &str, website: &str, email: &str) {
        self.leads.push(Lead {
            city: self.city.clone(),
            business_name: business_name.to_string(),
            website: website.to_string(),
            email: email.to_string(),
            category: self.category.clone(),
        });
    }

    pub fn into_leads(self) -> Vec<Lead> {
        self.leads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockSiteCrawler;

    fn place(name: &str, website: Option<&str>) -> Place {
        Place {
            id: format!("id-{name}"),
            display_name: name.to_string(),
            website_uri: website.map(|w| w.to_string()),
        }
    }

    #[tokio::test]
    async fn test_websiteless_place_consumes_nothing() {
        let crawler = MockSiteCrawler::new();
        let mut agg = ResultAggregator::new("Stockholm", "cafe", 3);

        agg.consume(&place("No Site AB", None), &crawler).await;

        assert_eq!(agg.cap_remaining(), 3);
        assert!(crawler.calls().is_empty());
        assert!(agg.into_leads().is_empty());
    }

    #[tokio::test]
    async fn test_no_emails_yields_one_empty_lead() {
        let crawler = MockSiteCrawler::new().with_site("https://tyst.se", &[]);
        let mut agg = ResultAggregator::new("Stockholm", "cafe", 3);

        agg.consume(&place("Tyst AB", Some("https://tyst.se")), &crawler)
            .await;

        let leads = agg.into_leads();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].email, "");
        assert_eq!(leads[0].business_name, "Tyst AB");
        assert_eq!(leads[0].website, "https://tyst.se");
    }

    #[tokio::test]
    async fn test_one_lead_per_distinct_email() {
        let crawler = MockSiteCrawler::new()
            .with_site("https://tva.se", &["a@tva.se", "b@tva.se"]);
        let mut agg = ResultAggregator::new("Stockholm", "cafe", 5);

        agg.consume(&place("Tva AB", Some("https://tva.se")), &crawler)
            .await;

        let leads = agg.into_leads();
        assert_eq!(leads.len(), 2);
        assert!(leads.iter().all(|l| l.business_name == "Tva AB"));
    }

    #[tokio::test]
    async fn test_emails_truncate_at_cap() {
        let crawler = MockSiteCrawler::new()
            .with_site("https://many.se", &["a@many.se", "b@many.se", "c@many.se"]);
        let mut agg = ResultAggregator::new("Stockholm", "cafe", 2);

        agg.consume(&place("Many AB", Some("https://many.se")), &crawler)
            .await;

        assert!(agg.is_full());
        assert_eq!(agg.into_leads().len(), 2);
    }
}
