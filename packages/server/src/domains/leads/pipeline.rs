//! The lead discovery pipeline - one sequential task per job.
//!
//! City x category pairs run strictly in declaration order, with fixed
//! politeness delays between outbound requests. Search failures cost one
//! pair, crawl failures cost one path; only persistence failures abort the
//! run. The HTTP handler awaits `run` directly today; the function is shaped
//! so a worker could `tokio::spawn` it unchanged.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::kernel::{BasePlaceSearch, BaseSiteCrawler, PlacePage};

use super::aggregator::ResultAggregator;
use super::model::{Lead, LeadJob};
use super::store::LeadJobStore;

/// Hard ceiling on the page size the places API accepts.
const MAX_PAGE_SIZE: usize = 20;

/// Pacing for outbound traffic. Defaults are production values; tests use
/// `start_paused` tokio time so the sleeps cost nothing.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Delay before each next-page request within one pair
    pub page_delay: Duration,
    /// Delay between consecutive (city, category) pairs
    pub pair_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(2),
            pair_delay: Duration::from_secs(1),
        }
    }
}

pub struct LeadPipeline {
    store: Arc<dyn LeadJobStore>,
    place_search: Arc<dyn BasePlaceSearch>,
    site_crawler: Arc<dyn BaseSiteCrawler>,
    options: PipelineOptions,
}

impl LeadPipeline {
    pub fn new(
        store: Arc<dyn LeadJobStore>,
        place_search: Arc<dyn BasePlaceSearch>,
        site_crawler: Arc<dyn BaseSiteCrawler>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            place_search,
            site_crawler,
            options,
        }
    }

    /// Execute the job to completion and finalize it. On a fatal error the
    /// job is marked failed (best effort) and the error propagates.
    pub async fn run(&self, job: &LeadJob) -> Result<Vec<Lead>> {
        match self.execute(job).await {
            Ok(leads) => {
                self.store.finalize(job.id, leads.clone()).await?;
                info!(job_id = %job.id, leads = leads.len(), "Lead job completed");
                Ok(leads)
            }
            Err(e) => {
                if let Err(mark_err) = self.store.mark_failed(job.id, &e.to_string()).await {
                    warn!(job_id = %job.id, error = %mark_err, "Failed to mark job failed");
                }
                Err(e)
            }
        }
    }

    async fn execute(&self, job: &LeadJob) -> Result<Vec<Lead>> {
        let cities = &job.cities.0;
        let categories = &job.business_types.0;
        let cap = job.max_results_per_city.max(0) as usize;
        let total_steps = job.total_steps.max(1);

        let mut all_leads = Vec::new();
        let mut steps_done = 0i32;

        for city in cities {
            for category in categories {
                if steps_done > 0 && !self.options.pair_delay.is_zero() {
                    tokio::time::sleep(self.options.pair_delay).await;
                }

                let pair_leads = self.collect_pair(city, category, cap).await;
                info!(
                    job_id = %job.id,
                    city = %city,
                    category = %category,
                    leads = pair_leads.len(),
                    "Finished city/category pair"
                );
                all_leads.extend(pair_leads);

                // Sub-pair granularity is not tracked: progress moves only
                // after all pagination for the pair is done.
                steps_done += 1;
                let progress = steps_done * 100 / total_steps;
                self.store.update_progress(job.id, progress).await?;
            }
        }

        Ok(all_leads)
    }

    /// All leads for one (city, category) pair, across pagination, capped.
    async fn collect_pair(&self, city: &str, category: &str, cap: usize) -> Vec<Lead> {
        let query = format!("{category} in {city}");
        let mut aggregator = ResultAggregator::new(city, category, cap);
        let mut page_token: Option<String> = None;

        loop {
            if aggregator.is_full() {
                break;
            }

            // Politeness delay before every follow-up page request.
            if page_token.is_some() && !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }

            let page_size = aggregator.cap_remaining().min(MAX_PAGE_SIZE) as i32;
            let page = match self
                .place_search
                .search(&query, page_size, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    // One bad upstream response costs this pair, not the job.
                    warn!(query = %query, error = %e, "Place search failed for pair");
                    PlacePage::default()
                }
            };

            for place in &page.places {
                if aggregator.is_full() {
                    break;
                }
                aggregator
                    .consume(place, self.site_crawler.as_ref())
                    .await;
            }

            match page.next_page_token {
                Some(token) if !aggregator.is_full() => page_token = Some(token),
                _ => break,
            }
        }

        aggregator.into_leads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::leads::model::LeadJobStatus;
    use crate::domains::leads::store::InMemoryLeadJobStore;
    use crate::kernel::test_dependencies::{place_page, MockPlaceSearch, MockSiteCrawler};
    use std::time::Duration as StdDuration;

    struct Harness {
        store: Arc<InMemoryLeadJobStore>,
        search: Arc<MockPlaceSearch>,
        crawler: Arc<MockSiteCrawler>,
    }

    impl Harness {
        fn pipeline(&self) -> LeadPipeline {
            LeadPipeline::new(
                self.store.clone(),
                self.search.clone(),
                self.crawler.clone(),
                PipelineOptions::default(),
            )
        }

        async fn start_job(&self, cities: &[&str], categories: &[&str], cap: i32) -> LeadJob {
            let job = LeadJob::new(
                "user-1",
                cities.iter().map(|c| c.to_string()).collect(),
                categories.iter().map(|c| c.to_string()).collect(),
                cap,
            );
            self.store
                .create_if_not_rate_limited(job, StdDuration::from_secs(60))
                .await
                .unwrap()
                .unwrap()
        }
    }

    fn harness(search: MockPlaceSearch, crawler: MockSiteCrawler) -> Harness {
        Harness {
            store: Arc::new(InMemoryLeadJobStore::new()),
            search: Arc::new(search),
            crawler: Arc::new(crawler),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_for_one_pair_does_not_fail_the_job() {
        let search = MockPlaceSearch::new()
            .with_page(
                "cafe in Stockholm",
                place_page(&[("Kafe Ett", Some("https://kafe-ett.se"))], None),
            )
            .with_failing_query("cafe in Gothenburg");
        let crawler = MockSiteCrawler::new().with_site("https://kafe-ett.se", &["info@kafe-ett.se"]);
        let h = harness(search, crawler);

        let job = h.start_job(&["Stockholm", "Gothenburg"], &["cafe"], 5).await;
        let leads = h.pipeline().run(&job).await.unwrap();

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].city, "Stockholm");

        let stored = h.store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Completed);
        assert_eq!(stored.progress, 100);
        assert_eq!(stored.results.0.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotone_and_hits_100_only_on_completion() {
        let search = MockPlaceSearch::new();
        let h = harness(search, MockSiteCrawler::new());

        let job = h
            .start_job(&["Stockholm", "Gothenburg"], &["cafe", "bakery"], 2)
            .await;
        h.pipeline().run(&job).await.unwrap();

        let log = h.store.progress_log(job.id);
        assert_eq!(log, vec![25, 50, 75, 100]);
        assert!(log.windows(2).all(|w| w[0] <= w[1]));

        let stored = h.store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Completed);
        assert_eq!(stored.progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_stops_crawling_mid_page() {
        // 20 candidates, each with a site yielding one unique email; cap 5.
        let mut entries = Vec::new();
        let mut crawler = MockSiteCrawler::new();
        let websites: Vec<String> = (0..20).map(|i| format!("https://biz-{i}.se")).collect();
        for (i, website) in websites.iter().enumerate() {
            entries.push((format!("Biz {i}"), website.clone()));
            let email = format!("info@biz-{i}.se");
            crawler = crawler.with_site(website, &[email.as_str()]);
        }
        let entry_refs: Vec<(&str, Option<&str>)> = entries
            .iter()
            .map(|(name, site)| (name.as_str(), Some(site.as_str())))
            .collect();
        let search =
            MockPlaceSearch::new().with_page("cafe in Stockholm", place_page(&entry_refs, None));
        let h = harness(search, crawler);

        let job = h.start_job(&["Stockholm"], &["cafe"], 5).await;
        let leads = h.pipeline().run(&job).await.unwrap();

        assert_eq!(leads.len(), 5);
        // The 6th candidate is never crawled.
        assert_eq!(h.crawler.calls().len(), 5);
        assert!(!h.crawler.was_crawled("https://biz-5.se"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagination_forwards_token_and_shrinks_page_size() {
        let search = MockPlaceSearch::new()
            .with_page(
                "cafe in Stockholm",
                place_page(
                    &[
                        ("Biz 0", Some("https://b0.se")),
                        ("Biz 1", Some("https://b1.se")),
                    ],
                    Some("tok-2"),
                ),
            )
            .with_page(
                "cafe in Stockholm",
                place_page(&[("Biz 2", Some("https://b2.se"))], None),
            );
        let crawler = MockSiteCrawler::new()
            .with_site("https://b0.se", &["a@b0.se"])
            .with_site("https://b1.se", &["a@b1.se"])
            .with_site("https://b2.se", &["a@b2.se"]);
        let h = harness(search, crawler);

        let job = h.start_job(&["Stockholm"], &["cafe"], 10).await;
        let leads = h.pipeline().run(&job).await.unwrap();
        assert_eq!(leads.len(), 3);

        let calls = h.search.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].page_token, None);
        assert_eq!(calls[0].page_size, 10);
        assert_eq!(calls[1].page_token.as_deref(), Some("tok-2"));
        // Two leads already emitted, so the follow-up page asks for less.
        assert_eq!(calls[1].page_size, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concrete_stockholm_cafe_scenario() {
        // 5 places: 3 with websites, 2 without. Site A repeats one email on
        // two probed paths (the crawler's set semantics collapse it), site B
        // carries two distinct emails, site C is never reached because the
        // cap of 3 fills first.
        let search = MockPlaceSearch::new().with_page(
            "cafe in Stockholm",
            place_page(
                &[
                    ("Kafe A", Some("https://a.se")),
                    ("Kafe Utan", None),
                    ("Kafe B", Some("https://b.se")),
                    ("Kafe Utan Tva", None),
                    ("Kafe C", Some("https://c.se")),
                ],
                None,
            ),
        );
        let crawler = MockSiteCrawler::new()
            .with_site("https://a.se", &["hej@a.se"])
            .with_site("https://b.se", &["hej@b.se", "vd@b.se"])
            .with_site("https://c.se", &["hej@c.se"]);
        let h = harness(search, crawler);

        let job = h.start_job(&["Stockholm"], &["cafe"], 3).await;
        let leads = h.pipeline().run(&job).await.unwrap();

        assert_eq!(leads.len(), 3);
        assert_eq!(
            leads.iter().filter(|l| l.business_name == "Kafe A").count(),
            1
        );
        assert_eq!(
            leads.iter().filter(|l| l.business_name == "Kafe B").count(),
            2
        );
        assert!(!h.crawler.was_crawled("https://c.se"));
        assert_eq!(h.crawler.calls().len(), 2);

        let stored = h.store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Completed);
        assert_eq!(stored.progress, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_search_results_still_complete() {
        let h = harness(MockPlaceSearch::new(), MockSiteCrawler::new());

        let job = h.start_job(&["Nowhere"], &["cafe"], 5).await;
        let leads = h.pipeline().run(&job).await.unwrap();

        assert!(leads.is_empty());
        let stored = h.store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadJobStatus::Completed);
        assert_eq!(stored.progress, 100);
    }
}
