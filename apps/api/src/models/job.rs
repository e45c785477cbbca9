use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// Application pipeline stage. Stored as its display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Saved,
    Applied,
    #[serde(rename = "Phone Interview")]
    PhoneInterview,
    #[serde(rename = "Technical Interview")]
    TechnicalInterview,
    #[serde(rename = "Onsite Interview")]
    OnsiteInterview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 7] = [
        JobStatus::Saved,
        JobStatus::Applied,
        JobStatus::PhoneInterview,
        JobStatus::TechnicalInterview,
        JobStatus::OnsiteInterview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Saved => "Saved",
            JobStatus::Applied => "Applied",
            JobStatus::PhoneInterview => "Phone Interview",
            JobStatus::TechnicalInterview => "Technical Interview",
            JobStatus::OnsiteInterview => "Onsite Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }

    pub fn is_interview(&self) -> bool {
        matches!(
            self,
            JobStatus::PhoneInterview | JobStatus::TechnicalInterview | JobStatus::OnsiteInterview
        )
    }

    /// Every stage except `Saved` implies the application was sent.
    pub fn has_applied(&self) -> bool {
        !matches!(self, JobStatus::Saved)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown job status '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub status: String,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_added: DateTime<Utc>,
    pub date_applied: Option<DateTime<Utc>>,
    /// Serialized `ParsedDescription`. Decoded on read, never trusted.
    #[serde(skip_serializing)]
    pub parsed_data: Option<String>,
    #[serde(skip_serializing)]
    pub company_data: Option<String>,
    #[serde(skip_serializing)]
    pub company_reviews: Option<String>,
}

impl JobRow {
    /// Unknown stored values are treated as `Saved`.
    pub fn status(&self) -> JobStatus {
        self.status.parse().unwrap_or(JobStatus::Saved)
    }
}

/// Decodes one of the JSON text columns. Undecodable values become `None`
/// and leave a warning for the response instead of failing the request.
pub fn decode_stored<T: DeserializeOwned>(
    raw: Option<&str>,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let raw = raw.filter(|r| !r.trim().is_empty())?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Stored {label} could not be decoded: {e}");
            warnings.push(format!("Stored {label} could not be read and was ignored"));
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub content: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrips_display_names() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
        assert_eq!(
            "phone interview".parse::<JobStatus>().unwrap(),
            JobStatus::PhoneInterview
        );
        assert!("Ghosted".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_groups() {
        assert!(JobStatus::TechnicalInterview.is_interview());
        assert!(!JobStatus::Offer.is_interview());
        assert!(JobStatus::Rejected.has_applied());
        assert!(!JobStatus::Saved.has_applied());
    }

    #[test]
    fn test_decode_stored_collects_warnings() {
        let mut warnings = Vec::new();

        let ok: Option<serde_json::Value> =
            decode_stored(Some(r#"{"a": 1}"#), "parsed data", &mut warnings);
        let missing: Option<serde_json::Value> = decode_stored(None, "parsed data", &mut warnings);
        let broken: Option<serde_json::Value> =
            decode_stored(Some("{not json"), "company data", &mut warnings);

        assert!(ok.is_some());
        assert!(missing.is_none());
        assert!(broken.is_none());
        assert_eq!(warnings, vec!["Stored company data could not be read and was ignored"]);
    }
}
