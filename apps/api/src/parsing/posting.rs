//! Job posting page fetcher. Reads a handful of known LinkedIn selectors;
//! not a general crawler.

use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::parsing::job_details::JobDetails;
use crate::parsing::normalize::clean_text;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const TITLE_SELECTORS: &[&str] = &["h1.job-title", "h1.topcard__title"];
const COMPANY_SELECTORS: &[&str] = &["a.company-name", "a.topcard__org-name-link"];
const LOCATION_SELECTORS: &[&str] = &["span.job-location", "span.topcard__flavor--bullet"];
const DESCRIPTION_SELECTORS: &[&str] = &["div.description__text", "div.show-more-less-html__markup"];

#[derive(Debug, Error)]
pub enum PostingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("posting page returned status {0}")]
    Status(u16),

    #[error("no job details found on the page")]
    NothingFound,
}

#[derive(Clone)]
pub struct PostingFetcher {
    client: Client,
}

impl PostingFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PostingError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<JobDetails, PostingError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Posting fetch for {url} returned {status}");
            return Err(PostingError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        let details = parse_posting_html(&html, url);
        if details.title.is_empty() && details.description.is_empty() {
            return Err(PostingError::NothingFound);
        }
        debug!("Extracted posting '{}' from {url}", details.title);
        Ok(details)
    }
}

/// Reads title, company, location, description and the criteria list
/// (employment type, salary) from a posting page.
pub fn parse_posting_html(html: &str, url: &str) -> JobDetails {
    let document = Html::parse_document(html);

    let mut details = JobDetails {
        title: first_inline_text(&document, TITLE_SELECTORS),
        company: first_inline_text(&document, COMPANY_SELECTORS),
        location: first_inline_text(&document, LOCATION_SELECTORS),
        description: first_block_text(&document, DESCRIPTION_SELECTORS),
        url: url.to_string(),
        ..JobDetails::default()
    };

    let (Ok(item_selector), Ok(header_selector), Ok(value_selector)) = (
        Selector::parse("li.job-criteria__item"),
        Selector::parse("h3.job-criteria__subheader"),
        Selector::parse("span.job-criteria__text"),
    ) else {
        return details;
    };

    for item in document.select(&item_selector) {
        let Some(header) = item.select(&header_selector).next() else {
            continue;
        };
        let Some(value) = item.select(&value_selector).next() else {
            continue;
        };
        let header = inline_text(header);
        if header.contains("Employment type") {
            details.job_type = inline_text(value);
        } else if header.contains("Salary") {
            details.salary = inline_text(value);
        }
    }

    details
}

fn first_element<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document.select(&selector).next()
    })
}

fn first_inline_text(document: &Html, selectors: &[&str]) -> String {
    first_element(document, selectors)
        .map(inline_text)
        .unwrap_or_default()
}

fn first_block_text(document: &Html, selectors: &[&str]) -> String {
    first_element(document, selectors)
        .map(|el| clean_text(&el.text().collect::<Vec<_>>().join("\n")))
        .unwrap_or_default()
}

fn inline_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
