use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::{prompts::json_system, ChatRequest, LlmClient};
use crate::parsing::extractor::{ExtractError, Extractor};
use crate::parsing::prompts::{JD_SECTIONS_PROMPT_TEMPLATE, JD_SECTIONS_ROLE};
use crate::parsing::sections::{
    ParseMetadata, ParsedDescription, ParsedSection, ParsingMethod, SectionTitle,
};

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 4000;

/// Leading bullet glyphs and list numbering. `5+ years` is left alone.
static BULLET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*(?:[•▪●·*–-]|\d{1,2}[.)](?:\s|$)|\([a-zA-Z0-9]{1,2}\)))+\s*")
        .expect("Invalid bullet regex")
});

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Value,
}

/// Sends the description to the chat model and post-processes its sections.
pub struct LlmExtractor {
    llm: LlmClient,
}

impl LlmExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<ParsedDescription, ExtractError> {
        let system = json_system(JD_SECTIONS_ROLE);
        let prompt = build_prompt(text);

        let reply: Value = self
            .llm
            .chat_json(ChatRequest {
                system: &system,
                prompt: &prompt,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;

        let sections = postprocess(raw_sections(reply)?);
        info!(
            "LLM parsed description into {} sections (model: {})",
            sections.len(),
            self.llm.model()
        );

        Ok(ParsedDescription {
            sections,
            metadata: ParseMetadata {
                parsing_method: ParsingMethod::Llm,
                model: Some(self.llm.model().to_string()),
            },
        })
    }
}

fn build_prompt(text: &str) -> String {
    let titles = SectionTitle::ALL
        .iter()
        .map(|t| format!("- {}", t.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    JD_SECTIONS_PROMPT_TEMPLATE
        .replace("{section_titles}", &titles)
        .replace("{jd_text}", text)
}

/// Accepts `{"sections": [...]}` or a bare array of sections.
fn raw_sections(reply: Value) -> Result<Vec<RawSection>, ExtractError> {
    let list = match reply {
        Value::Object(mut map) => map
            .remove("sections")
            .ok_or_else(|| ExtractError::Shape("object without a 'sections' key".to_string()))?,
        array @ Value::Array(_) => array,
        other => {
            return Err(ExtractError::Shape(format!(
                "expected an object or array, got {other}"
            )))
        }
    };

    let raw: Vec<RawSection> =
        serde_json::from_value(list).map_err(|e| ExtractError::Shape(e.to_string()))?;
    if raw.is_empty() {
        return Err(ExtractError::Shape("reply contained no sections".to_string()));
    }
    Ok(raw)
}

/// Converts, cleans and de-duplicates sections (first title wins).
/// If cleaning would leave nothing, the uncleaned conversion is returned instead.
fn postprocess(raw: Vec<RawSection>) -> Vec<ParsedSection> {
    let converted: Vec<ParsedSection> = raw.into_iter().map(convert).collect();

    let mut seen = HashSet::new();
    let cleaned: Vec<ParsedSection> = converted
        .iter()
        .filter_map(|section| {
            let section = section.cleaned()?;
            seen.insert(section.title.clone()).then_some(section)
        })
        .collect();

    if cleaned.is_empty() {
        warn!("Cleaning emptied every LLM section; keeping the uncleaned result");
        return converted;
    }
    cleaned
}

fn convert(raw: RawSection) -> ParsedSection {
    let label = raw.title.as_deref().map(str::trim).unwrap_or_default();
    let title = SectionTitle::from_label(label)
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| label.to_string());

    let is_list = match raw.kind.as_deref().map(str::trim) {
        Some(kind) => kind.eq_ignore_ascii_case("list"),
        None => raw.content.is_array(),
    };

    if is_list {
        let items = match raw.content {
            Value::String(text) => text.lines().map(strip_bullet).collect(),
            Value::Array(values) => values
                .into_iter()
                .filter_map(value_text)
                .map(|item| strip_bullet(&item))
                .collect(),
            Value::Null => Vec::new(),
            other => vec![other.to_string()],
        };
        let items = items.into_iter().filter(|i: &String| !i.is_empty()).collect();
        ParsedSection::list(title, items)
    } else {
        let text = match raw.content {
            Value::String(text) => text,
            Value::Array(values) => values
                .into_iter()
                .filter_map(value_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        ParsedSection::paragraph(title, text)
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn strip_bullet(item: &str) -> String {
    BULLET_RE.replace(item.trim(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::parsing::extractor::FallbackExtractor;
    use crate::parsing::heuristic::{heuristic_extract, HeuristicExtractor};
    use crate::parsing::sections::{SectionContent, SectionKind};
    use crate::test_support::{client_for, completion_body, mock_llm, offline_client};

    const JD: &str = "\
About Us
We are a fintech company building payment rails for small businesses across Europe.

Requirements
- 5+ years of experience building distributed systems
- Strong knowledge of SQL and data modelling
- Clear written communication
";

    fn fallback_over(llm: LlmClient) -> FallbackExtractor {
        FallbackExtractor::new(
            Arc::new(LlmExtractor::new(llm)),
            Arc::new(HeuristicExtractor),
        )
    }

    #[tokio::test]
    async fn test_fenced_reply_is_post_processed() {
        let sections = json!({
            "sections": [
                {"title": "about the role", "type": "paragraph", "content": "Own the payments API. Show more"},
                {"title": "Skills", "type": "list", "content": "- Rust\n• SQL\n\n3) Kubernetes"},
                {"title": "Experience", "type": "list", "content": ["- 5+ years building backends"]},
                {"title": "Skills", "type": "list", "content": ["Duplicate block"]},
                {"title": "Benefits", "type": "list", "content": ["show more", "  "]}
            ]
        });
        let reply = format!("Here you go:\n```json\n{sections}\n```");
        let url = mock_llm(StatusCode::OK, completion_body(&reply)).await;

        let parsed = LlmExtractor::new(client_for(url)).extract(JD).await.unwrap();

        assert_eq!(parsed.metadata.parsing_method, ParsingMethod::Llm);
        assert_eq!(parsed.metadata.model.as_deref(), Some("test-model"));
        let titles: Vec<_> = parsed.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["About the Role", "Skills", "Experience"]);

        assert_eq!(
            parsed.section("About the Role").unwrap().content,
            SectionContent::Text("Own the payments API.".to_string())
        );
        let skills = parsed.section("Skills").unwrap();
        assert_eq!(skills.kind, SectionKind::List);
        assert_eq!(
            skills.content,
            SectionContent::Items(vec![
                "Rust".to_string(),
                "SQL".to_string(),
                "Kubernetes".to_string()
            ])
        );
        assert_eq!(
            parsed.section("Experience").unwrap().content,
            SectionContent::Items(vec!["5+ years building backends".to_string()])
        );
    }

    #[tokio::test]
    async fn test_top_level_array_is_accepted() {
        let reply = json!([{"title": "Benefits", "type": "list", "content": ["Remote work"]}]);
        let url = mock_llm(StatusCode::OK, completion_body(&reply.to_string())).await;

        let parsed = LlmExtractor::new(client_for(url)).extract(JD).await.unwrap();
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].title, "Benefits");
    }

    #[tokio::test]
    async fn test_server_error_falls_back_to_heuristic() {
        let url = mock_llm(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error": {"message": "upstream exploded"}}"#.to_string(),
        )
        .await;

        let direct = LlmExtractor::new(client_for(url.clone())).extract(JD).await;
        assert!(matches!(
            direct,
            Err(ExtractError::Llm(LlmError::Api { status: 500, .. }))
        ));

        let parsed = fallback_over(client_for(url)).parse(JD).await;
        assert_eq!(parsed, heuristic_extract(JD));
        assert_eq!(parsed.metadata.parsing_method, ParsingMethod::Heuristic);
    }

    #[tokio::test]
    async fn test_auth_failure_falls_back_to_heuristic() {
        let url = mock_llm(StatusCode::UNAUTHORIZED, String::new()).await;
        let parsed = fallback_over(client_for(url)).parse(JD).await;
        assert_eq!(parsed, heuristic_extract(JD));
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back_to_heuristic() {
        let url = mock_llm(StatusCode::TOO_MANY_REQUESTS, String::new()).await;
        let parsed = fallback_over(client_for(url)).parse(JD).await;
        assert_eq!(parsed, heuristic_extract(JD));
    }

    #[tokio::test]
    async fn test_prose_reply_falls_back_to_heuristic() {
        let url = mock_llm(
            StatusCode::OK,
            completion_body("I'm sorry, I can't parse this posting."),
        )
        .await;
        let parsed = fallback_over(client_for(url)).parse(JD).await;
        assert_eq!(parsed, heuristic_extract(JD));
    }

    #[tokio::test]
    async fn test_empty_section_list_is_a_shape_error() {
        let url = mock_llm(StatusCode::OK, completion_body(r#"{"sections": []}"#)).await;
        let result = LlmExtractor::new(client_for(url)).extract(JD).await;
        assert!(matches!(result, Err(ExtractError::Shape(_))));
    }

    #[tokio::test]
    async fn test_missing_key_falls_back_without_network() {
        let result = LlmExtractor::new(offline_client()).extract(JD).await;
        assert!(matches!(
            result,
            Err(ExtractError::Llm(LlmError::MissingCredentials))
        ));

        let parsed = fallback_over(offline_client()).parse(JD).await;
        assert_eq!(parsed, heuristic_extract(JD));
    }

    #[test]
    fn test_uncleaned_result_is_kept_when_cleaning_empties_everything() {
        let raw: Vec<RawSection> = serde_json::from_value(json!([
            {"title": "Benefits", "type": "list", "content": ["Show more"]}
        ]))
        .unwrap();
        let sections = postprocess(raw);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].content,
            SectionContent::Items(vec!["Show more".to_string()])
        );
    }

    #[test]
    fn test_strip_bullet_keeps_leading_numbers_that_are_not_markers() {
        assert_eq!(strip_bullet("- 5+ years of Rust"), "5+ years of Rust");
        assert_eq!(strip_bullet("2. Ship features"), "Ship features");
        assert_eq!(strip_bullet("(a) Mentor juniors"), "Mentor juniors");
        assert_eq!(strip_bullet("3.5 GPA or higher"), "3.5 GPA or higher");
    }

    #[test]
    fn test_prompt_lists_every_title_and_the_text() {
        let prompt = build_prompt("Build payment rails");
        for title in SectionTitle::ALL {
            assert!(prompt.contains(title.as_str()));
        }
        assert!(prompt.contains("Build payment rails"));
        assert!(!prompt.contains("{jd_text}"));
    }
}
