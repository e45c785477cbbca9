use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::LlmError;
use crate::parsing::normalize::clean_text;
use crate::parsing::sections::{ParsedDescription, ParsedSection, FALLBACK_TITLE};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("unexpected reply shape: {0}")]
    Shape(String),
}

/// Turns raw job-description text into titled sections.
///
/// Default: `FallbackExtractor` over `LlmExtractor` then `HeuristicExtractor`.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ParsedDescription, ExtractError>;
}

/// Tries `primary`; on any failure logs why and delegates to `fallback`.
pub struct FallbackExtractor {
    primary: Arc<dyn Extractor>,
    fallback: Arc<dyn Extractor>,
}

impl FallbackExtractor {
    pub fn new(primary: Arc<dyn Extractor>, fallback: Arc<dyn Extractor>) -> Self {
        Self { primary, fallback }
    }

    /// Never fails. If both extractors error, the whole text becomes one
    /// "Job Description" section.
    pub async fn parse(&self, text: &str) -> ParsedDescription {
        match self.extract(text).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Fallback extractor failed ({e}); returning the text as one section");
                ParsedDescription::heuristic(vec![ParsedSection::paragraph(
                    FALLBACK_TITLE,
                    clean_text(text),
                )])
            }
        }
    }
}

#[async_trait]
impl Extractor for FallbackExtractor {
    async fn extract(&self, text: &str) -> Result<ParsedDescription, ExtractError> {
        match self.primary.extract(text).await {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                log_fallback(&e);
                self.fallback.extract(text).await
            }
        }
    }
}

fn log_fallback(error: &ExtractError) {
    match error {
        ExtractError::Llm(LlmError::MissingCredentials) => {
            info!("No LLM API key configured; using heuristic parsing")
        }
        ExtractError::Llm(e) if e.is_auth_failure() => {
            warn!("LLM authentication failed; falling back to heuristic parsing")
        }
        ExtractError::Llm(e) if e.is_rate_limited() => {
            warn!("LLM rate limit exceeded; falling back to heuristic parsing")
        }
        other => warn!("LLM parsing failed ({other}); falling back to heuristic parsing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::heuristic::{heuristic_extract, HeuristicExtractor};
    use crate::parsing::sections::ParsingMethod;

    struct Failing;

    #[async_trait]
    impl Extractor for Failing {
        async fn extract(&self, _text: &str) -> Result<ParsedDescription, ExtractError> {
            Err(ExtractError::Shape("always fails".to_string()))
        }
    }

    struct Fixed;

    #[async_trait]
    impl Extractor for Fixed {
        async fn extract(&self, _text: &str) -> Result<ParsedDescription, ExtractError> {
            Ok(ParsedDescription {
                sections: vec![ParsedSection::paragraph("Skills", "Rust")],
                metadata: crate::parsing::sections::ParseMetadata {
                    parsing_method: ParsingMethod::Llm,
                    model: Some("fixed".to_string()),
                },
            })
        }
    }

    const TEXT: &str = "Benefits\n- Private health insurance for the whole family\n- Learning budget";

    #[tokio::test]
    async fn test_primary_result_is_used_when_it_succeeds() {
        let extractor = FallbackExtractor::new(Arc::new(Fixed), Arc::new(HeuristicExtractor));
        let parsed = extractor.parse(TEXT).await;
        assert_eq!(parsed.metadata.parsing_method, ParsingMethod::Llm);
        assert_eq!(parsed.sections.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_delegates_to_fallback() {
        let extractor = FallbackExtractor::new(Arc::new(Failing), Arc::new(HeuristicExtractor));
        assert_eq!(extractor.parse(TEXT).await, heuristic_extract(TEXT));
    }

    #[tokio::test]
    async fn test_parse_never_fails_when_both_fail() {
        let extractor = FallbackExtractor::new(Arc::new(Failing), Arc::new(Failing));
        let parsed = extractor.parse("  some text  ").await;
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[0].title, FALLBACK_TITLE);
        assert_eq!(parsed.metadata.parsing_method, ParsingMethod::Heuristic);
    }
}
