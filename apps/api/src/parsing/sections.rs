//! Section model shared by every extractor.

use serde::{Deserialize, Serialize};

use crate::parsing::normalize::{clean_items, clean_text};

/// The fixed job-description taxonomy, in extraction priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTitle {
    AboutCompany,
    AboutRole,
    Responsibilities,
    Requirements,
    Skills,
    Education,
    Experience,
    Benefits,
    AdditionalInformation,
}

/// Title used when nothing in the taxonomy was recognized.
pub const FALLBACK_TITLE: &str = "Job Description";

impl SectionTitle {
    pub const ALL: [SectionTitle; 9] = [
        SectionTitle::AboutCompany,
        SectionTitle::AboutRole,
        SectionTitle::Responsibilities,
        SectionTitle::Requirements,
        SectionTitle::Skills,
        SectionTitle::Education,
        SectionTitle::Experience,
        SectionTitle::Benefits,
        SectionTitle::AdditionalInformation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionTitle::AboutCompany => "About the Company",
            SectionTitle::AboutRole => "About the Role",
            SectionTitle::Responsibilities => "Responsibilities",
            SectionTitle::Requirements => "Requirements",
            SectionTitle::Skills => "Skills",
            SectionTitle::Education => "Education",
            SectionTitle::Experience => "Experience",
            SectionTitle::Benefits => "Benefits",
            SectionTitle::AdditionalInformation => "Additional Information",
        }
    }

    /// Case- and whitespace-insensitive lookup, with a few common aliases.
    pub fn from_label(label: &str) -> Option<SectionTitle> {
        let key = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end_matches(':')
            .to_lowercase();

        let title = match key.as_str() {
            "about the company" | "about us" | "about company" | "company" => {
                SectionTitle::AboutCompany
            }
            "about the role" | "about the position" | "role" | "overview" => SectionTitle::AboutRole,
            "responsibilities" | "duties" => SectionTitle::Responsibilities,
            "requirements" | "qualifications" => SectionTitle::Requirements,
            "skills" => SectionTitle::Skills,
            "education" => SectionTitle::Education,
            "experience" => SectionTitle::Experience,
            "benefits" | "perks" => SectionTitle::Benefits,
            "additional information" | "additional info" | "other information" => {
                SectionTitle::AdditionalInformation
            }
            _ => return None,
        };
        Some(title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Paragraph,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionContent {
    Text(String),
    Items(Vec<String>),
}

impl SectionContent {
    pub fn is_empty(&self) -> bool {
        match self {
            SectionContent::Text(text) => text.trim().is_empty(),
            SectionContent::Items(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

/// One titled block of a parsed description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSection {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub content: SectionContent,
}

impl ParsedSection {
    pub fn paragraph(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: SectionKind::Paragraph,
            content: SectionContent::Text(text.into()),
        }
    }

    pub fn list(title: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            title: title.into(),
            kind: SectionKind::List,
            content: SectionContent::Items(items),
        }
    }

    /// Runs the text normalizer over the content.
    /// Returns `None` when nothing is left, so callers can drop the section.
    pub fn cleaned(&self) -> Option<ParsedSection> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        let content = match &self.content {
            SectionContent::Text(text) => SectionContent::Text(clean_text(text)),
            SectionContent::Items(items) => SectionContent::Items(clean_items(items)),
        };
        if content.is_empty() {
            return None;
        }
        Some(ParsedSection {
            title: title.to_string(),
            kind: self.kind,
            content,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMethod {
    Heuristic,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub parsing_method: ParsingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Full structured output of description parsing. Persisted as `jobs.parsed_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDescription {
    pub sections: Vec<ParsedSection>,
    pub metadata: ParseMetadata,
}

impl ParsedDescription {
    pub fn heuristic(sections: Vec<ParsedSection>) -> Self {
        Self {
            sections,
            metadata: ParseMetadata {
                parsing_method: ParsingMethod::Heuristic,
                model: None,
            },
        }
    }

    #[cfg(test)]
    pub fn section(&self, title: &str) -> Option<&ParsedSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Re-cleans every section for display, dropping those left empty.
    pub fn cleaned_for_display(mut self) -> Self {
        self.sections = self.sections.iter().filter_map(ParsedSection::cleaned).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_serializes_with_type_key() {
        let section = ParsedSection::list("Skills", vec!["Rust".to_string()]);
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["type"], "list");
        assert_eq!(json["content"][0], "Rust");
    }

    #[test]
    fn test_parsed_description_roundtrips_stored_shape() {
        let stored = r#"{
            "sections": [
                {"title": "About the Role", "type": "paragraph", "content": "Build things."},
                {"title": "Skills", "type": "list", "content": ["Rust", "SQL"]}
            ],
            "metadata": {"parsing_method": "llm", "model": "llama-3.3-70b-versatile"}
        }"#;
        let parsed: ParsedDescription = serde_json::from_str(stored).unwrap();
        assert_eq!(parsed.metadata.parsing_method, ParsingMethod::Llm);
        assert_eq!(
            parsed.section("Skills").unwrap().content,
            SectionContent::Items(vec!["Rust".to_string(), "SQL".to_string()])
        );
    }

    #[test]
    fn test_from_label_is_case_insensitive() {
        assert_eq!(
            SectionTitle::from_label("  about THE   company: "),
            Some(SectionTitle::AboutCompany)
        );
        assert_eq!(SectionTitle::from_label("Perks"), Some(SectionTitle::Benefits));
        assert_eq!(SectionTitle::from_label("Salary"), None);
    }

    #[test]
    fn test_cleaned_drops_empty_sections() {
        let empty = ParsedSection::list("Skills", vec!["show more".to_string(), "  ".to_string()]);
        assert!(empty.cleaned().is_none());

        let untitled = ParsedSection::paragraph("  ", "content");
        assert!(untitled.cleaned().is_none());
    }

    #[test]
    fn test_taxonomy_titles_are_distinct() {
        let mut titles: Vec<_> = SectionTitle::ALL.iter().map(|t| t.as_str()).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 9);
    }
}
