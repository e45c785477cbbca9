//! Axum route handlers for the job-description parser.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::store::{self, NewJob};
use crate::models::job::{JobRow, JobStatus};
use crate::parsing::job_details::{extract_job_details, JobDetails};
use crate::parsing::sections::ParsedDescription;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseUrlRequest {
    pub url: String,
}

/// Proposed job fields plus the sectioned description, for review before saving.
#[derive(Debug, Serialize)]
pub struct ParsePreviewResponse {
    pub job_details: JobDetails,
    pub parsed_data: Option<ParsedDescription>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmParseRequest {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub parsed_data: Option<ParsedDescription>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/parse/text
pub async fn handle_parse_text(
    State(state): State<AppState>,
    Json(req): Json<ParseTextRequest>,
) -> Result<Json<ParsePreviewResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("Job description text cannot be empty".to_string()));
    }

    let job_details = extract_job_details(&req.text);
    let parsed = state.extractor.parse(&job_details.description).await;
    info!(
        "Parsed pasted description into {} sections ({:?})",
        parsed.sections.len(),
        parsed.metadata.parsing_method
    );

    Ok(Json(ParsePreviewResponse {
        job_details,
        parsed_data: Some(parsed),
    }))
}

/// POST /api/v1/parse/url
///
/// 409 when a job with the same URL is already tracked, 422 when the page
/// yields nothing usable.
pub async fn handle_parse_url(
    State(state): State<AppState>,
    Json(req): Json<ParseUrlRequest>,
) -> Result<Json<ParsePreviewResponse>, AppError> {
    let url = req.url.trim();
    url::Url::parse(url).map_err(|e| AppError::Validation(format!("Invalid URL: {e}")))?;

    if let Some(existing) = store::find_job_by_url(&state.db, url).await? {
        return Err(AppError::Conflict(format!(
            "This job is already tracked (id {})",
            existing.id
        )));
    }

    let job_details = state.posting.fetch(url).await.map_err(|e| {
        AppError::UnprocessableEntity(format!("Could not extract job details from the URL: {e}"))
    })?;

    let parsed_data = if job_details.description.trim().is_empty() {
        None
    } else {
        Some(state.extractor.parse(&job_details.description).await)
    };

    Ok(Json(ParsePreviewResponse {
        job_details,
        parsed_data,
    }))
}

/// POST /api/v1/parse/confirm
/// Saves a reviewed preview as a new job in the `Saved` stage.
pub async fn handle_confirm_parse(
    State(state): State<AppState>,
    Json(req): Json<ConfirmParseRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    if req.title.trim().is_empty() || req.company.trim().is_empty() {
        return Err(AppError::Validation("Job title and company are required".to_string()));
    }

    let parsed_data = req
        .parsed_data
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(anyhow::Error::from)?;

    let job = store::insert_job(
        &state.db,
        &NewJob {
            title: req.title.trim().to_string(),
            company: req.company.trim().to_string(),
            location: req.location,
            description: req.description,
            url: req.url.filter(|u| !u.trim().is_empty()),
            salary: req.salary,
            job_type: req.job_type,
            status: JobStatus::Saved,
            date_posted: None,
            date_applied: None,
            parsed_data,
        },
    )
    .await?;

    info!("Saved parsed job {} ('{}' at {})", job.id, job.title, job.company);
    Ok((StatusCode::CREATED, Json(job)))
}
