//! Best-effort discovery of a company's website, LinkedIn and Glassdoor URLs.
//!
//! Candidates come from a `SearchProvider`. The bundled `SimulatedSearch`
//! fabricates plausible results from the company name and performs no I/O;
//! swap in a real search API behind the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Job boards, social networks and reference sites: never a company's own site.
const EXCLUDED_DOMAINS: &[&str] = &[
    "linkedin.com",
    "glassdoor.com",
    "indeed.com",
    "monster.com",
    "ziprecruiter.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "wikipedia.org",
    "bloomberg.com",
    "crunchbase.com",
];

static LINKEDIN_COMPANY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://(?:www\.)?linkedin\.com/company/[^/\s"]+"#)
        .expect("Invalid LinkedIn URL regex")
});

static GLASSDOOR_REVIEWS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://(?:www\.)?glassdoor\.(?:com|co\.[a-z]{2})/Reviews/[^/\s"]+-Reviews-[^/\s"]+"#)
        .expect("Invalid Glassdoor URL regex")
});

/// Web search returning result links, best first.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<String>>;
}

/// Deterministic stand-in for a search API.
pub struct SimulatedSearch;

#[async_trait]
impl SearchProvider for SimulatedSearch {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<String>> {
        Ok(simulated_results(query))
    }
}

fn simulated_results(query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let name_for = |suffix: &str| query.replace(suffix, "").trim().to_string();
    let domain_for = |name: &str| name.replace([' ', ',', '.'], "");

    if query.contains("official website") {
        let name = name_for("official website");
        let domain = domain_for(&name);
        vec![
            format!("https://www.{domain}.com"),
            format!("https://www.{domain}.io"),
            format!("https://www.linkedin.com/company/{domain}"),
            format!("https://en.wikipedia.org/wiki/{}", name.replace(' ', "_")),
        ]
    } else if query.contains("linkedin company") {
        let domain = domain_for(&name_for("linkedin company"));
        vec![
            format!("https://www.linkedin.com/company/{domain}"),
            format!("https://www.{domain}.com/about"),
            format!("https://www.glassdoor.com/Overview/{domain}-Overview-EI_IE12345.11,20.htm"),
        ]
    } else if query.contains("glassdoor reviews") {
        let domain = domain_for(&name_for("glassdoor reviews"));
        vec![
            format!(
                "https://www.glassdoor.com/Reviews/{}-Reviews-E12345.htm",
                title_case(&domain)
            ),
            format!("https://www.glassdoor.com/Reviews/{domain}-Reviews-E12345.htm"),
            format!("https://www.indeed.com/cmp/{domain}/reviews"),
            format!("https://www.linkedin.com/company/{domain}/reviews"),
        ]
    } else {
        Vec::new()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Discovered URLs. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredUrls {
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub glassdoor_url: Option<String>,
}

pub struct UrlDiscovery {
    search: Arc<dyn SearchProvider>,
}

impl UrlDiscovery {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self { search }
    }

    /// Never fails: a search error leaves the corresponding URL empty.
    pub async fn discover(&self, company_name: &str) -> DiscoveredUrls {
        let name = company_name.trim().to_lowercase();
        if name.is_empty() {
            return DiscoveredUrls::default();
        }

        let website_url = self
            .candidates(&format!("{name} official website"))
            .await
            .and_then(|c| select_website(&name, &c));
        let linkedin_url = self
            .candidates(&format!("{name} linkedin company"))
            .await
            .and_then(|c| first_match(&LINKEDIN_COMPANY_RE, &c));
        let glassdoor_url = self
            .candidates(&format!("{name} glassdoor reviews"))
            .await
            .and_then(|c| first_match(&GLASSDOOR_REVIEWS_RE, &c));

        debug!(
            "Discovered URLs for '{company_name}': website={website_url:?}, linkedin={linkedin_url:?}, glassdoor={glassdoor_url:?}"
        );
        DiscoveredUrls {
            website_url,
            linkedin_url,
            glassdoor_url,
        }
    }

    async fn candidates(&self, query: &str) -> Option<Vec<String>> {
        match self.search.search(query).await {
            Ok(results) if !results.is_empty() => Some(results),
            Ok(_) => None,
            Err(e) => {
                warn!("Search for '{query}' failed: {e}");
                None
            }
        }
    }
}

fn is_excluded(candidate: &str) -> bool {
    EXCLUDED_DOMAINS.iter().any(|d| candidate.contains(d))
}

/// Picks the company's own site: the first non-excluded candidate whose main
/// domain label contains a token of the company name, otherwise the first
/// non-excluded candidate. Subdomains other than `www` are skipped in the
/// first pass. Returns `https://<host>`.
pub fn select_website(company_name: &str, candidates: &[String]) -> Option<String> {
    let tokens: Vec<String> = company_name
        .to_lowercase()
        .split_whitespace()
        .map(String::from)
        .collect();

    let hosts: Vec<String> = candidates
        .iter()
        .filter(|c| !is_excluded(c))
        .filter_map(|c| Url::parse(c).ok())
        .filter_map(|url| url.host_str().map(str::to_lowercase))
        .collect();

    let matching = hosts.iter().find(|host| {
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() < 2 || (parts.len() > 2 && parts[0] != "www") {
            return false;
        }
        let main = if parts[0] == "www" {
            parts[parts.len() - 2]
        } else {
            parts[0]
        };
        tokens.iter().any(|t| main.contains(t.as_str()))
    });

    matching
        .or_else(|| hosts.first())
        .map(|host| format!("https://{host}"))
}

fn first_match(pattern: &Regex, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find_map(|c| pattern.find(c).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_website_prefers_company_token_domain() {
        let candidates = strings(&[
            "https://www.linkedin.com/company/acme",
            "https://blog.acme.com/post",
            "https://www.example.org",
            "https://www.acmecorp.com/about",
        ]);
        assert_eq!(
            select_website("Acme Corp", &candidates),
            Some("https://www.acmecorp.com".to_string())
        );
    }

    #[test]
    fn test_select_website_falls_back_to_first_allowed() {
        let candidates = strings(&[
            "https://en.wikipedia.org/wiki/Initech",
            "https://www.example.org/initech",
        ]);
        assert_eq!(
            select_website("Initech", &candidates),
            Some("https://www.example.org".to_string())
        );
    }

    #[test]
    fn test_select_website_none_when_everything_excluded() {
        let candidates = strings(&["https://www.indeed.com/cmp/acme"]);
        assert_eq!(select_website("Acme", &candidates), None);
    }

    #[test]
    fn test_site_specific_patterns() {
        let candidates = strings(&[
            "https://www.glassdoor.com/Overview/acme-Overview-EI_IE1.htm",
            "https://www.glassdoor.co.uk/Reviews/Acme-Reviews-E1.htm",
        ]);
        assert_eq!(
            first_match(&GLASSDOOR_REVIEWS_RE, &candidates),
            Some("https://www.glassdoor.co.uk/Reviews/Acme-Reviews-E1.htm".to_string())
        );
        assert_eq!(first_match(&LINKEDIN_COMPANY_RE, &candidates), None);
    }

    #[tokio::test]
    async fn test_simulated_discovery() {
        let discovery = UrlDiscovery::new(Arc::new(SimulatedSearch));
        let urls = discovery.discover("Acme Corp").await;
        assert_eq!(urls.website_url.as_deref(), Some("https://www.acmecorp.com"));
        assert_eq!(
            urls.linkedin_url.as_deref(),
            Some("https://www.linkedin.com/company/acmecorp")
        );
        assert_eq!(
            urls.glassdoor_url.as_deref(),
            Some("https://www.glassdoor.com/Reviews/Acmecorp-Reviews-E12345.htm")
        );
    }

    struct BrokenSearch;

    #[async_trait]
    impl SearchProvider for BrokenSearch {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<String>> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_search_failure_yields_empty_fields() {
        let discovery = UrlDiscovery::new(Arc::new(BrokenSearch));
        assert_eq!(discovery.discover("Acme").await, DiscoveredUrls::default());
    }
}
