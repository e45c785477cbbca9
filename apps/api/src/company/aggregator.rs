use serde_json::{json, Value};
use tracing::{info, warn};

use crate::company::profile::{
    fallback_profile, fallback_review_summary, CompanyData, CompanyProfile, CompanyReviews,
    ReviewSummary, SourceMetadata,
};
use crate::company::prompts::{
    GLASSDOOR_PROMPT_TEMPLATE, GLASSDOOR_ROLE, LINKEDIN_PROMPT_TEMPLATE, LINKEDIN_ROLE,
    PROFILE_PROMPT_TEMPLATE, PROFILE_ROLE, REVIEWS_PROMPT_TEMPLATE, REVIEWS_ROLE,
    WEBSITE_PROMPT_TEMPLATE, WEBSITE_ROLE,
};
use crate::llm_client::{
    prompts::{json_system, NO_INVENTION_INSTRUCTION},
    ChatRequest, LlmClient,
};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 1000;
const LINKEDIN_MAX_TOKENS: u32 = 800;

/// Researches companies through the chat model.
///
/// None of the public methods fail: every error is logged and replaced by a
/// fallback built from whatever the per-source lookups returned.
pub struct CompanyAggregator {
    llm: LlmClient,
}

impl CompanyAggregator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    pub async fn fetch_company_data(
        &self,
        company_name: &str,
        website_url: Option<&str>,
        linkedin_url: Option<&str>,
    ) -> CompanyData {
        let system = json_system(PROFILE_ROLE);
        let prompt = PROFILE_PROMPT_TEMPLATE
            .replace("{company_name}", company_name)
            .replace("{website_url}", website_url.unwrap_or("N/A"))
            .replace("{linkedin_url}", linkedin_url.unwrap_or("N/A"));
        let prompt = format!("{prompt}\n\n{NO_INVENTION_INSTRUCTION}");

        let sources: Vec<String> = [website_url, linkedin_url]
            .into_iter()
            .flatten()
            .map(String::from)
            .collect();

        let result = self
            .llm
            .chat_json::<CompanyProfile>(self.request(&system, &prompt, MAX_TOKENS))
            .await;

        let (consolidated_info, fallback, errors) = match result {
            Ok(profile) => {
                info!("Company profile for '{company_name}' built by {}", self.llm.model());
                (profile, false, Vec::new())
            }
            Err(e) => {
                warn!("Company profile lookup for '{company_name}' failed, using fallback: {e}");
                let (website, linkedin) = if e.is_malformed_reply() {
                    self.partial_profile_sources(website_url, linkedin_url).await
                } else {
                    (None, None)
                };
                (
                    fallback_profile(website.as_ref(), linkedin.as_ref()),
                    true,
                    vec![e.to_string()],
                )
            }
        };

        CompanyData {
            name: company_name.to_string(),
            website_url: website_url.map(String::from),
            linkedin_url: linkedin_url.map(String::from),
            consolidated_info,
            metadata: SourceMetadata {
                sources,
                fallback,
                model: Some(self.llm.model().to_string()),
                errors,
            },
        }
    }

    pub async fn fetch_company_reviews(
        &self,
        company_name: &str,
        glassdoor_url: Option<&str>,
    ) -> CompanyReviews {
        let system = json_system(REVIEWS_ROLE);
        let prompt = REVIEWS_PROMPT_TEMPLATE
            .replace("{company_name}", company_name)
            .replace("{glassdoor_url}", glassdoor_url.unwrap_or("N/A"));
        let prompt = format!("{prompt}\n\n{NO_INVENTION_INSTRUCTION}");

        let result = self
            .llm
            .chat_json::<ReviewSummary>(self.request(&system, &prompt, MAX_TOKENS))
            .await;

        let (structured_reviews, fallback, errors) = match result {
            Ok(summary) => (summary, false, Vec::new()),
            Err(e) => {
                warn!("Review lookup for '{company_name}' failed, using fallback: {e}");
                let glassdoor = match glassdoor_url {
                    Some(url) if e.is_malformed_reply() => {
                        Some(self.fetch_glassdoor_reviews(url).await)
                    }
                    _ => None,
                };
                (
                    fallback_review_summary(company_name, glassdoor.as_ref()),
                    true,
                    vec![e.to_string()],
                )
            }
        };

        CompanyReviews {
            company_name: company_name.to_string(),
            glassdoor_url: glassdoor_url.map(String::from),
            structured_reviews,
            metadata: SourceMetadata {
                sources: glassdoor_url.map(String::from).into_iter().collect(),
                fallback,
                model: Some(self.llm.model().to_string()),
                errors,
            },
        }
    }

    /// Title, description, about text and contact info of a company site.
    pub async fn fetch_website_info(&self, url: &str) -> Value {
        self.source_lookup(url, "website info", WEBSITE_ROLE, WEBSITE_PROMPT_TEMPLATE, MAX_TOKENS)
            .await
    }

    /// Industry, employees, headquarters and founding year from a LinkedIn page.
    pub async fn fetch_linkedin_info(&self, url: &str) -> Value {
        self.source_lookup(
            url,
            "LinkedIn info",
            LINKEDIN_ROLE,
            LINKEDIN_PROMPT_TEMPLATE,
            LINKEDIN_MAX_TOKENS,
        )
        .await
    }

    /// Rating, review count, pros, cons and culture ratings from Glassdoor.
    pub async fn fetch_glassdoor_reviews(&self, url: &str) -> Value {
        self.source_lookup(
            url,
            "Glassdoor reviews",
            GLASSDOOR_ROLE,
            GLASSDOOR_PROMPT_TEMPLATE,
            MAX_TOKENS,
        )
        .await
    }

    /// Returns `{"url", "errors"}` instead of failing.
    async fn source_lookup(
        &self,
        url: &str,
        label: &str,
        role: &str,
        template: &str,
        max_tokens: u32,
    ) -> Value {
        let system = json_system(role);
        let prompt = template.replace("{url}", url);

        match self
            .llm
            .chat_json::<Value>(self.request(&system, &prompt, max_tokens))
            .await
        {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => source_failure(url, label, &format!("expected an object, got {other}")),
            Err(e) => {
                warn!("{label} lookup for {url} failed: {e}");
                source_failure(url, label, &e.to_string())
            }
        }
    }

    /// Per-source lookups feeding the fallback profile.
    async fn partial_profile_sources(
        &self,
        website_url: Option<&str>,
        linkedin_url: Option<&str>,
    ) -> (Option<Value>, Option<Value>) {
        let website = match website_url {
            Some(url) => Some(self.fetch_website_info(url).await),
            None => None,
        };
        let linkedin = match linkedin_url {
            Some(url) => Some(self.fetch_linkedin_info(url).await),
            None => None,
        };
        (website, linkedin)
    }

    fn request<'a>(&self, system: &'a str, prompt: &'a str, max_tokens: u32) -> ChatRequest<'a> {
        ChatRequest {
            system,
            prompt,
            temperature: TEMPERATURE,
            max_tokens,
        }
    }
}

fn source_failure(url: &str, label: &str, reason: &str) -> Value {
    json!({
        "url": url,
        "errors": [format!("Failed to extract {label}: {reason}")]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::profile::{Recommendation, NOT_AVAILABLE, UNKNOWN};
    use crate::test_support::{client_for, completion_body, mock_llm, mock_llm_with, offline_client};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_profile_from_model_reply() {
        let reply = r#"```json
{"company_description": "Builds rockets", "industry": "Aerospace", "founded": 2002,
 "products_services": ["Falcon 9", "Dragon"], "contact_info": {"email": "hi@spacex.test"}}
```"#;
        let url = mock_llm(StatusCode::OK, completion_body(reply)).await;
        let aggregator = CompanyAggregator::new(client_for(url));

        let data = aggregator
            .fetch_company_data("SpaceX", Some("https://www.spacex.com"), None)
            .await;

        assert!(!data.metadata.fallback);
        assert_eq!(data.metadata.sources, vec!["https://www.spacex.com"]);
        assert_eq!(data.consolidated_info.industry.as_deref(), Some("Aerospace"));
        assert_eq!(data.consolidated_info.founded.as_deref(), Some("2002"));
        assert_eq!(data.consolidated_info.products_services.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_gives_unknown_profile() {
        let aggregator = CompanyAggregator::new(offline_client());
        let data = aggregator
            .fetch_company_data("Acme", None, Some("https://www.linkedin.com/company/acme"))
            .await;

        assert!(data.metadata.fallback);
        assert_eq!(data.metadata.errors.len(), 1);
        assert_eq!(data.consolidated_info.industry.as_deref(), Some(UNKNOWN));
        assert_eq!(
            data.consolidated_info.company_description.as_deref(),
            Some(NOT_AVAILABLE)
        );
    }

    fn linkedin_only(body: &str) -> (StatusCode, String) {
        if body.contains(LINKEDIN_ROLE) {
            let reply = r#"{"industry": "Technology", "employees": "500-1000", "founded": "2015"}"#;
            (StatusCode::OK, completion_body(reply))
        } else {
            (StatusCode::OK, completion_body("I was unable to browse that page."))
        }
    }

    #[tokio::test]
    async fn test_malformed_profile_falls_back_to_linkedin_data() {
        let url = mock_llm_with(linkedin_only).await;
        let aggregator = CompanyAggregator::new(client_for(url));

        let data = aggregator
            .fetch_company_data("Acme", None, Some("https://www.linkedin.com/company/acme"))
            .await;
        let profile = data.consolidated_info;

        assert!(data.metadata.fallback);
        assert_eq!(profile.industry.as_deref(), Some("Technology"));
        assert_eq!(profile.company_size.as_deref(), Some("500-1000"));
        assert_eq!(profile.founded.as_deref(), Some("2015"));
        assert_eq!(profile.company_description.as_deref(), Some(NOT_AVAILABLE));
    }

    fn glassdoor_only(body: &str) -> (StatusCode, String) {
        if body.contains(GLASSDOOR_ROLE) {
            let reply = r#"{"overall_rating": 4.5, "review_count": 210,
                "pros": ["Smart colleagues"], "cons": ["Long hours"]}"#;
            (StatusCode::OK, completion_body(reply))
        } else {
            (StatusCode::OK, completion_body("no json here"))
        }
    }

    #[tokio::test]
    async fn test_malformed_reviews_use_glassdoor_rating() {
        let url = mock_llm_with(glassdoor_only).await;
        let aggregator = CompanyAggregator::new(client_for(url));

        let reviews = aggregator
            .fetch_company_reviews("Acme", Some("https://www.glassdoor.com/Reviews/Acme-Reviews-E1.htm"))
            .await;
        let summary = reviews.structured_reviews;

        assert!(reviews.metadata.fallback);
        assert_eq!(summary.recommendation, Some(Recommendation::Positive));
        assert_eq!(summary.key_strengths, vec!["Smart colleagues"]);
        assert_eq!(summary.areas_for_improvement, vec!["Long hours"]);
    }

    #[tokio::test]
    async fn test_server_error_skips_source_lookups() {
        let url = mock_llm(StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()).await;
        let aggregator = CompanyAggregator::new(client_for(url));

        let reviews = aggregator
            .fetch_company_reviews("Acme", Some("https://www.glassdoor.com/Reviews/Acme-Reviews-E1.htm"))
            .await;

        assert!(reviews.metadata.fallback);
        assert_eq!(
            reviews.structured_reviews.recommendation,
            Some(Recommendation::Insufficient)
        );
    }

    #[tokio::test]
    async fn test_source_lookup_failure_shape() {
        let url = mock_llm(StatusCode::UNAUTHORIZED, "{}".to_string()).await;
        let aggregator = CompanyAggregator::new(client_for(url));

        let value = aggregator.fetch_website_info("https://acme.test").await;

        assert_eq!(value["url"], "https://acme.test");
        assert_eq!(value["errors"].as_array().map(Vec::len), Some(1));
    }
}
