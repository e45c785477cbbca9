use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::company::discovery::DiscoveredUrls;
use crate::company::profile::{CompanyData, CompanyReviews};
use crate::company::store;
use crate::errors::AppError;
use crate::jobs::store as job_store;
use crate::models::company::CompanySourceRow;
use crate::models::job::{decode_stored, JobRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    #[serde(default)]
    pub auto_discover: bool,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub glassdoor_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyInfoResponse {
    pub job_id: Uuid,
    pub company_name: String,
    pub company_source: CompanySourceRow,
    pub company_data: Option<CompanyData>,
    pub company_reviews: Option<CompanyReviews>,
    pub refreshed: bool,
    pub warnings: Vec<String>,
}

/// GET /api/v1/jobs/:id/company
/// Discovers source URLs the first time and fetches whatever is still missing.
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CompanyInfoResponse>, AppError> {
    let job = load_job(&state, job_id).await?;

    let (source, refreshed) = match store::find_source_by_name(&state.db, &job.company).await? {
        Some(source) if source.has_any_url() => (source, false),
        existing => {
            let urls = state.discovery.discover(&job.company).await;
            let source = match existing {
                Some(source) => store::fill_missing_urls(&state.db, source.id, &urls).await?,
                None => store::insert_source(&state.db, &job.company, &urls).await?,
            };
            let refreshed = refresh_company(&state, &job, &source, true).await?;
            (source, refreshed)
        }
    };

    respond(&state, job_id, source, refreshed).await
}

/// POST /api/v1/jobs/:id/company/update
/// `auto_discover` fills empty URLs from discovery; otherwise the given
/// non-blank URLs replace the stored ones. Data is then re-fetched.
pub async fn handle_update_company(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<CompanyInfoResponse>, AppError> {
    let job = load_job(&state, job_id).await?;

    let source = match store::find_source_by_name(&state.db, &job.company).await? {
        Some(source) => source,
        None => store::insert_source(&state.db, &job.company, &DiscoveredUrls::default()).await?,
    };

    let source = if req.auto_discover {
        let urls = state.discovery.discover(&job.company).await;
        store::fill_missing_urls(&state.db, source.id, &urls).await?
    } else {
        let urls = DiscoveredUrls {
            website_url: non_blank(req.website_url),
            linkedin_url: non_blank(req.linkedin_url),
            glassdoor_url: non_blank(req.glassdoor_url),
        };
        store::replace_urls(&state.db, source.id, &urls).await?
    };

    let refreshed = refresh_company(&state, &job, &source, false).await?;
    respond(&state, job_id, source, refreshed).await
}

async fn load_job(state: &AppState, job_id: Uuid) -> Result<JobRow, AppError> {
    job_store::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Fetches company data when a website or LinkedIn URL is known and reviews
/// when a Glassdoor URL is known. With `only_missing`, values the job already
/// has are kept. Returns whether anything was written.
async fn refresh_company(
    state: &AppState,
    job: &JobRow,
    source: &CompanySourceRow,
    only_missing: bool,
) -> Result<bool, AppError> {
    let website = source.website_url.as_deref().filter(|u| !u.trim().is_empty());
    let linkedin = source.linkedin_url.as_deref().filter(|u| !u.trim().is_empty());
    let glassdoor = source.glassdoor_url.as_deref().filter(|u| !u.trim().is_empty());

    let company_data = if (website.is_some() || linkedin.is_some())
        && !(only_missing && job.company_data.is_some())
    {
        let data = state
            .company
            .fetch_company_data(&job.company, website, linkedin)
            .await;
        Some(serde_json::to_string(&data).map_err(anyhow::Error::from)?)
    } else {
        None
    };

    let company_reviews = match glassdoor {
        Some(url) if !(only_missing && job.company_reviews.is_some()) => {
            let reviews = state.company.fetch_company_reviews(&job.company, Some(url)).await;
            Some(serde_json::to_string(&reviews).map_err(anyhow::Error::from)?)
        }
        _ => None,
    };

    if company_data.is_none() && company_reviews.is_none() {
        return Ok(false);
    }

    job_store::set_company_data(
        &state.db,
        job.id,
        company_data.as_deref(),
        company_reviews.as_deref(),
    )
    .await?;
    info!("Company information for '{}' refreshed (job {})", job.company, job.id);
    Ok(true)
}

async fn respond(
    state: &AppState,
    job_id: Uuid,
    source: CompanySourceRow,
    refreshed: bool,
) -> Result<Json<CompanyInfoResponse>, AppError> {
    let job = load_job(state, job_id).await?;
    let mut warnings = Vec::new();
    let company_data = decode_stored(job.company_data.as_deref(), "company data", &mut warnings);
    let company_reviews =
        decode_stored(job.company_reviews.as_deref(), "company reviews", &mut warnings);

    Ok(Json(CompanyInfoResponse {
        job_id,
        company_name: job.company,
        company_source: source,
        company_data,
        company_reviews,
        refreshed,
        warnings,
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
