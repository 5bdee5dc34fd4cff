//! Email harvesting from raw HTML.
//!
//! Pure string work: a regex pass over the document plus mailto: anchors,
//! filtered against a blocklist of public consumer email providers so the
//! pipeline only surfaces addresses that plausibly belong to the business.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
}

/// Domains that never identify a business inbox. The set is injectable so
/// deployments can extend it without a code change.
const DEFAULT_BLOCKLIST: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "yahoo.com",
    "live.com",
    "icloud.com",
    "aol.com",
    "msn.com",
    "protonmail.com",
];

/// Extracts email-shaped strings from HTML, minus blocklisted providers.
///
/// No network or I/O; safe to call from anywhere.
#[derive(Debug, Clone)]
pub struct EmailExtractor {
    blocklist: HashSet<String>,
}

impl EmailExtractor {
    /// Extractor with the built-in consumer-provider blocklist plus any
    /// extra domains from configuration.
    pub fn new(extra_blocked_domains: &[String]) -> Self {
        let mut blocklist: HashSet<String> = DEFAULT_BLOCKLIST
            .iter()
            .map(|d| d.to_string())
            .collect();
        blocklist.extend(
            extra_blocked_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty()),
        );
        Self { blocklist }
    }

    /// Extract the deduplicated set of business emails from an HTML document.
    pub fn extract(&self, html: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        for m in EMAIL_RE.find_iter(html) {
            self.consider(m.as_str(), &mut found);
        }

        // mailto: anchors carry addresses the text regex can miss
        // (obfuscated link text, emails split across markup).
        for candidate in mailto_addresses(html) {
            self.consider(&candidate, &mut found);
        }

        found
    }

    fn consider(&self, candidate: &str, found: &mut BTreeSet<String>) {
        let email = candidate.trim().trim_end_matches('.').to_lowercase();
        if !EMAIL_RE.is_match(&email) {
            return;
        }
        let Some(domain) = email.rsplit('@').next() else {
            return;
        };
        if self.blocklist.contains(domain) {
            return;
        }
        found.insert(email);
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Pull addresses out of `<a href="mailto:...">` anchors.
fn mailto_addresses(html: &str) -> Vec<String> {
    let selector = match Selector::parse(r#"a[href^="mailto:"]"#) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let document = Html::parse_document(html);
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| href.strip_prefix("mailto:"))
        .flat_map(|target| {
            // A mailto target may list several recipients and carry ?subject=
            let addresses = target.split('?').next().unwrap_or("");
            addresses
                .split(',')
                .map(|a| a.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|a| !a.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_business_emails() {
        let extractor = EmailExtractor::default();
        let html = r#"<p>Reach us at info@example-bageri.se or boss@gmail.com</p>"#;

        let emails = extractor.extract(html);
        assert!(emails.contains("info@example-bageri.se"));
        assert!(!emails.contains("boss@gmail.com"));
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let extractor = EmailExtractor::default();
        let emails = extractor.extract("Contact Owner@Gmail.COM today");
        assert!(emails.is_empty());
    }

    #[test]
    fn test_deduplicates_matches() {
        let extractor = EmailExtractor::default();
        let html = "sales@acme.se ... sales@acme.se ... SALES@acme.se";
        let emails = extractor.extract(html);
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("sales@acme.se"));
    }

    #[test]
    fn test_mailto_anchor() {
        let extractor = EmailExtractor::default();
        let html = r#"<a href="mailto:hello@acme.se?subject=Hi">Write to us</a>"#;
        let emails = extractor.extract(html);
        assert!(emails.contains("hello@acme.se"));
    }

    #[test]
    fn test_extra_blocked_domains() {
        let extractor = EmailExtractor::new(&["spamtrap.example".to_string()]);
        let emails = extractor.extract("a@spamtrap.example b@company.example");
        assert_eq!(emails.len(), 1);
        assert!(emails.contains("b@company.example"));
    }

    #[test]
    fn test_no_emails() {
        let extractor = EmailExtractor::default();
        assert!(extractor.extract("<html><body>nothing here</body></html>").is_empty());
    }
}
