pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::company::handlers as company;
use crate::documents::handlers as documents;
use crate::jobs::handlers as jobs;
use crate::parsing::handlers as parsing;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/dashboard", get(jobs::handle_dashboard))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/status", patch(jobs::handle_update_status))
        .route("/api/v1/jobs/:id/parse", post(jobs::handle_parse_job))
        .route("/api/v1/jobs/:id/notes", post(jobs::handle_add_note))
        .route("/api/v1/notes/:id", delete(jobs::handle_delete_note))
        .route("/api/v1/jobs/:id/contacts", post(jobs::handle_add_contact))
        .route(
            "/api/v1/contacts/:id",
            put(jobs::handle_update_contact).delete(jobs::handle_delete_contact),
        )
        // Parser
        .route("/api/v1/parse/text", post(parsing::handle_parse_text))
        .route("/api/v1/parse/url", post(parsing::handle_parse_url))
        .route("/api/v1/parse/confirm", post(parsing::handle_confirm_parse))
        // Company research
        .route("/api/v1/jobs/:id/company", get(company::handle_get_company))
        .route(
            "/api/v1/jobs/:id/company/update",
            post(company::handle_update_company),
        )
        // Documents
        .route(
            "/api/v1/cv",
            get(documents::handle_download_cv).post(documents::handle_upload_cv),
        )
        .route(
            "/api/v1/documents/:kind",
            get(documents::handle_list_documents).post(documents::handle_upload_document),
        )
        .route(
            "/api/v1/documents/:kind/:filename",
            get(documents::handle_download_document).delete(documents::handle_delete_document),
        )
        .with_state(state)
}
