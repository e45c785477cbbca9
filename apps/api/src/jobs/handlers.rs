//! Axum route handlers for jobs, notes, contacts and the dashboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::store::{self, ContactFields, JobUpdate, NewJob};
use crate::models::job::{decode_stored, ContactRow, JobRow, JobStatus, NoteRow};
use crate::parsing::sections::ParsedDescription;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
}

/// Body for both create and full update.
#[derive(Debug, Deserialize)]
pub struct JobRequest {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub status: Option<String>,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_applied: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobDetailResponse {
    pub job: JobRow,
    pub notes: Vec<NoteRow>,
    pub contacts: Vec<ContactRow>,
    pub parsed_data: Option<ParsedDescription>,
    pub warnings: Vec<String>,
}

/// Job counts per pipeline stage. `saved` is whatever the other buckets
/// leave over, so unknown stored statuses count as saved.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total: i64,
    pub applied: i64,
    pub interviews: i64,
    pub offers: i64,
    pub rejected: i64,
    pub saved: i64,
}

impl DashboardCounts {
    pub fn from_status_counts(counts: &[(String, i64)]) -> Self {
        let mut dashboard = DashboardCounts::default();
        for (status, count) in counts {
            dashboard.total += count;
            match status.parse::<JobStatus>() {
                Ok(JobStatus::Applied) => dashboard.applied += count,
                Ok(s) if s.is_interview() => dashboard.interviews += count,
                Ok(JobStatus::Offer) => dashboard.offers += count,
                Ok(JobStatus::Rejected) => dashboard.rejected += count,
                _ => {}
            }
        }
        dashboard.saved = dashboard.total
            - dashboard.applied
            - dashboard.interviews
            - dashboard.offers
            - dashboard.rejected;
        dashboard
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboard & jobs
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardCounts>, AppError> {
    let counts = store::status_counts(&state.db).await?;
    Ok(Json(DashboardCounts::from_status_counts(&counts)))
}

/// GET /api/v1/jobs?status=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => Some(parse_status(s)?),
    };
    let jobs = store::list_jobs(&state.db, status).await?;
    Ok(Json(jobs))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    validate_job(&req)?;
    let status = match req.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => JobStatus::Saved,
    };

    let job = store::insert_job(
        &state.db,
        &NewJob {
            title: req.title.trim().to_string(),
            company: req.company.trim().to_string(),
            location: req.location,
            description: req.description,
            url: req.url,
            salary: req.salary,
            job_type: req.job_type,
            status,
            date_posted: req.date_posted,
            date_applied: req.date_applied.filter(|_| status.has_applied()),
            parsed_data: None,
        },
    )
    .await?;

    info!("Created job {} ('{}' at {})", job.id, job.title, job.company);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
/// Stored section data is re-cleaned for display; undecodable JSON becomes a warning.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job = find_job(&state, id).await?;
    let notes = store::list_notes(&state.db, id).await?;
    let contacts = store::list_contacts(&state.db, id).await?;

    let mut warnings = Vec::new();
    let parsed_data = decode_stored::<ParsedDescription>(
        job.parsed_data.as_deref(),
        "parsed data",
        &mut warnings,
    )
    .map(ParsedDescription::cleaned_for_display);

    Ok(Json(JobDetailResponse {
        job,
        notes,
        contacts,
        parsed_data,
        warnings,
    }))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JobRequest>,
) -> Result<Json<JobRow>, AppError> {
    validate_job(&req)?;
    let current = find_job(&state, id).await?;
    let status = match req.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => current.status(),
    };
    let date_applied = if status.has_applied() {
        req.date_applied.or(current.date_applied)
    } else {
        None
    };

    let update = JobUpdate {
        title: req.title.trim().to_string(),
        company: req.company.trim().to_string(),
        location: req.location,
        description: req.description,
        url: req.url,
        salary: req.salary,
        job_type: req.job_type,
        status,
        date_posted: req.date_posted,
        date_applied,
    };
    let job = store::update_job(&state.db, id, &update)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
/// Notes and contacts are removed with the job.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_job(&state.db, id).await? {
        return Err(job_not_found(id));
    }
    info!("Deleted job {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/jobs/:id/status
/// Moving to Applied stamps `date_applied` when it is not set yet.
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<JobRow>, AppError> {
    let status = parse_status(&req.status)?;
    let current = find_job(&state, id).await?;

    let date_applied = match current.date_applied {
        None if status == JobStatus::Applied => Some(Utc::now()),
        existing => existing,
    };

    let job = store::update_status(&state.db, id, status, date_applied)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/parse
/// Runs the extractor over the stored description and caches the result.
pub async fn handle_parse_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParsedDescription>, AppError> {
    let job = find_job(&state, id).await?;
    let description = job
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            AppError::Validation("No job description available to parse".to_string())
        })?;

    let parsed = state.extractor.parse(description).await;
    let serialized = serde_json::to_string(&parsed).map_err(anyhow::Error::from)?;
    store::set_parsed_data(&state.db, id, &serialized).await?;

    info!(
        "Parsed job {id} into {} sections ({:?})",
        parsed.sections.len(),
        parsed.metadata.parsing_method
    );
    Ok(Json(parsed))
}

// ────────────────────────────────────────────────────────────────────────────
// Notes & contacts
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:id/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> Result<(StatusCode, Json<NoteRow>), AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Note content cannot be empty".to_string()));
    }
    find_job(&state, job_id).await?;

    let note = store::insert_note(&state.db, job_id, content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /api/v1/notes/:id
pub async fn handle_delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_note(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Note {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/contacts
pub async fn handle_add_contact(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactRow>), AppError> {
    let fields = contact_fields(req)?;
    find_job(&state, job_id).await?;

    let contact = store::insert_contact(&state.db, job_id, &fields).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// PUT /api/v1/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<ContactRow>, AppError> {
    let fields = contact_fields(req)?;
    let contact = store::update_contact(&state.db, id, &fields)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {id} not found")))?;
    Ok(Json(contact))
}

/// DELETE /api/v1/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_contact(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Contact {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn find_job(state: &AppState, id: Uuid) -> Result<JobRow, AppError> {
    store::get_job(&state.db, id)
        .await?
        .ok_or_else(|| job_not_found(id))
}

fn job_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

fn parse_status(raw: &str) -> Result<JobStatus, AppError> {
    raw.parse::<JobStatus>()
        .map_err(|_| AppError::Validation(format!("Unknown job status '{raw}'")))
}

fn validate_job(req: &JobRequest) -> Result<(), AppError> {
    if req.title.trim().is_empty() || req.company.trim().is_empty() {
        return Err(AppError::Validation("Job title and company are required".to_string()));
    }
    Ok(())
}

fn contact_fields(req: ContactRequest) -> Result<ContactFields, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Contact name is required".to_string()));
    }
    Ok(ContactFields {
        name,
        title: req.title,
        email: req.email,
        phone: req.phone,
        linkedin: req.linkedin,
        notes: req.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
        pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
    }

    #[test]
    fn test_dashboard_buckets() {
        let dashboard = DashboardCounts::from_status_counts(&counts(&[
            ("Saved", 4),
            ("Applied", 3),
            ("Phone Interview", 1),
            ("Technical Interview", 2),
            ("Onsite Interview", 1),
            ("Offer", 1),
            ("Rejected", 5),
        ]));

        assert_eq!(
            dashboard,
            DashboardCounts {
                total: 17,
                applied: 3,
                interviews: 4,
                offers: 1,
                rejected: 5,
                saved: 4,
            }
        );
    }

    #[test]
    fn test_unknown_status_counts_as_saved() {
        let dashboard = DashboardCounts::from_status_counts(&counts(&[("Archived", 2), ("Offer", 1)]));
        assert_eq!(dashboard.total, 3);
        assert_eq!(dashboard.saved, 2);
    }

    #[test]
    fn test_empty_dashboard() {
        assert_eq!(DashboardCounts::from_status_counts(&[]), DashboardCounts::default());
    }

    #[test]
    fn test_contact_name_required() {
        let req = ContactRequest {
            name: "   ".to_string(),
            title: None,
            email: None,
            phone: None,
            linkedin: None,
            notes: None,
        };
        assert!(matches!(contact_fields(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_status_rejects_unknown() {
        assert_eq!(parse_status("offer").unwrap(), JobStatus::Offer);
        assert!(matches!(parse_status("Ghosted"), Err(AppError::Validation(_))));
    }
}
