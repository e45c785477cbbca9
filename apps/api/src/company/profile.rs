//! Company profile and review-summary shapes, plus the deterministic
//! fallbacks used when the model cannot be reached.
//!
//! Model replies are loosely typed (a year may come back as a number, a list
//! as a comma-joined string), so the string and list fields deserialize
//! leniently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const NOT_AVAILABLE: &str = "Information not available";
pub const UNKNOWN: &str = "Unknown";

static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Invalid rating regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default, deserialize_with = "loose_string")]
    pub company_description: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub company_size: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub founded: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub headquarters: Option<String>,
    #[serde(default, deserialize_with = "loose_list")]
    pub products_services: Vec<String>,
    #[serde(default)]
    pub contact_info: Option<Value>,
    #[serde(default, deserialize_with = "loose_string")]
    pub mission_values: Option<String>,
}

/// Where a result came from and whether it is a fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyData {
    pub name: String,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub consolidated_info: CompanyProfile,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Positive,
    Neutral,
    Cautionary,
    Insufficient,
}

impl Recommendation {
    /// >= 4.0 positive, [3.0, 4.0) neutral, < 3.0 cautionary.
    pub fn from_rating(rating: Option<f64>) -> Self {
        match rating {
            Some(r) if r >= 4.0 => Recommendation::Positive,
            Some(r) if r >= 3.0 => Recommendation::Neutral,
            Some(_) => Recommendation::Cautionary,
            None => Recommendation::Insufficient,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Recommendation::Positive => {
                "Employees rate this company highly. A strong place to consider working."
            }
            Recommendation::Neutral => {
                "Reviews are mixed; worth considering, but ask about the concerns raised in reviews."
            }
            Recommendation::Cautionary => {
                "Employee ratings are below average. Proceed with caution and research the team carefully."
            }
            Recommendation::Insufficient => {
                "Insufficient information to make a recommendation."
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    #[serde(default, deserialize_with = "loose_string")]
    pub overall_assessment: Option<String>,
    #[serde(default, deserialize_with = "loose_list")]
    pub key_strengths: Vec<String>,
    #[serde(default, deserialize_with = "loose_list")]
    pub areas_for_improvement: Vec<String>,
    #[serde(default, deserialize_with = "loose_list")]
    pub culture_highlights: Vec<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub bottom_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReviews {
    pub company_name: String,
    pub glassdoor_url: Option<String>,
    pub structured_reviews: ReviewSummary,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

/// Builds a profile from whatever the website and LinkedIn lookups returned.
/// Missing description becomes "Information not available"; other missing
/// facts become "Unknown".
pub fn fallback_profile(website: Option<&Value>, linkedin: Option<&Value>) -> CompanyProfile {
    let from_website = |keys: &[&str]| website.and_then(|w| first_text(w, keys));
    let from_linkedin = |keys: &[&str]| {
        linkedin
            .and_then(|l| first_text(l, keys))
            .unwrap_or_else(|| UNKNOWN.to_string())
    };

    CompanyProfile {
        company_description: Some(
            from_website(&["description", "about_text"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        industry: Some(from_linkedin(&["industry"])),
        company_size: Some(from_linkedin(&["employees", "company_size"])),
        founded: Some(from_linkedin(&["founded"])),
        headquarters: Some(from_linkedin(&["headquarters"])),
        products_services: Vec::new(),
        contact_info: website
            .and_then(|w| w.get("contact_info"))
            .filter(|v| !v.is_null())
            .cloned(),
        mission_values: None,
    }
}

/// Summarizes a Glassdoor-style lookup without the model. The bottom line
/// follows the overall rating thresholds of `Recommendation::from_rating`.
pub fn fallback_review_summary(company_name: &str, glassdoor: Option<&Value>) -> ReviewSummary {
    let rating = glassdoor
        .and_then(|g| g.get("overall_rating"))
        .and_then(parse_rating);
    let review_count = glassdoor
        .and_then(|g| g.get("review_count"))
        .and_then(value_to_text);
    let recommendation = Recommendation::from_rating(rating);

    let overall_assessment = match (rating, review_count) {
        (Some(r), Some(n)) => format!("{company_name} has an overall rating of {r:.1}/5 across {n} reviews."),
        (Some(r), None) => format!("{company_name} has an overall rating of {r:.1}/5."),
        (None, _) => format!("No review data is available for {company_name}."),
    };

    let list = |key: &str| {
        glassdoor
            .and_then(|g| g.get(key))
            .map(value_to_list)
            .unwrap_or_default()
    };

    ReviewSummary {
        overall_assessment: Some(overall_assessment),
        key_strengths: list("pros"),
        areas_for_improvement: list("cons"),
        culture_highlights: glassdoor
            .and_then(|g| g.get("culture_ratings"))
            .map(culture_highlights)
            .unwrap_or_default(),
        bottom_line: Some(recommendation.text().to_string()),
        recommendation: Some(recommendation),
    }
}

/// Accepts `4.2`, `"4.2"` and `"4.2 / 5"`.
fn parse_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => RATING_RE.find(s).and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }?;
    rating.is_finite().then_some(rating)
}

fn culture_highlights(ratings: &Value) -> Vec<String> {
    match ratings {
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                let text = value_to_text(value)?;
                Some(format!("{}: {text}", humanize(key)))
            })
            .collect(),
        other => value_to_list(other),
    }
}

/// `work_life_balance` -> `Work life balance`.
fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn first_text(source: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| source.get(*key).and_then(value_to_text))
}

/// Scalar-ish rendering of a JSON value; `None` for null and blank strings.
pub fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn value_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        other => value_to_text(other).into_iter().collect(),
    }
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn loose_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_list(&value))
}
