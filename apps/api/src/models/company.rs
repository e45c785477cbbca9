use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Known URLs for one company, keyed loosely by name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanySourceRow {
    pub id: Uuid,
    pub company_name: String,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub glassdoor_url: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl CompanySourceRow {
    pub fn has_any_url(&self) -> bool {
        [&self.linkedin_url, &self.website_url, &self.glassdoor_url]
            .iter()
            .any(|url| url.as_deref().is_some_and(|u| !u.trim().is_empty()))
    }
}
