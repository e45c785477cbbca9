use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::job::{ContactRow, JobRow, JobStatus, NoteRow};

/// Column values for a new job. `parsed_data` is already serialized.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub status: JobStatus,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_applied: Option<DateTime<Utc>>,
    pub parsed_data: Option<String>,
}

/// Full replacement of the user-editable job columns.
#[derive(Debug, Clone)]
pub struct JobUpdate {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub status: JobStatus,
    pub date_posted: Option<DateTime<Utc>>,
    pub date_applied: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ContactFields {
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub notes: Option<String>,
}

pub async fn insert_job(pool: &PgPool, job: &NewJob) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, title, company, location, description, url, salary, job_type,
             status, date_posted, date_applied, parsed_data)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.description)
    .bind(&job.url)
    .bind(&job.salary)
    .bind(&job.job_type)
    .bind(job.status.as_str())
    .bind(job.date_posted)
    .bind(job.date_applied)
    .bind(&job.parsed_data)
    .fetch_one(pool)
    .await
}

/// Newest first. `None` lists every status.
pub async fn list_jobs(pool: &PgPool, status: Option<JobStatus>) -> Result<Vec<JobRow>, sqlx::Error> {
    match status {
        Some(status) => {
            sqlx::query_as::<_, JobRow>(
                "SELECT * FROM jobs WHERE status = $1 ORDER BY date_added DESC",
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY date_added DESC")
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_job_by_url(pool: &PgPool, url: &str) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE url = $1 ORDER BY date_added LIMIT 1")
        .bind(url)
        .fetch_optional(pool)
        .await
}

pub async fn update_job(
    pool: &PgPool,
    id: Uuid,
    update: &JobUpdate,
) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET title = $2, company = $3, location = $4, description = $5, url = $6,
            salary = $7, job_type = $8, status = $9, date_posted = $10, date_applied = $11
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&update.title)
    .bind(&update.company)
    .bind(&update.location)
    .bind(&update.description)
    .bind(&update.url)
    .bind(&update.salary)
    .bind(&update.job_type)
    .bind(update.status.as_str())
    .bind(update.date_posted)
    .bind(update.date_applied)
    .fetch_optional(pool)
    .await
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: JobStatus,
    date_applied: Option<DateTime<Utc>>,
) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "UPDATE jobs SET status = $2, date_applied = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(date_applied)
    .fetch_optional(pool)
    .await
}

/// Notes and contacts go with it (`ON DELETE CASCADE`).
pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_parsed_data(pool: &PgPool, id: Uuid, parsed_data: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET parsed_data = $2 WHERE id = $1")
        .bind(id)
        .bind(parsed_data)
        .execute(pool)
        .await?;
    Ok(())
}

/// Writes only the values that are `Some`; the others keep their stored value.
pub async fn set_company_data(
    pool: &PgPool,
    id: Uuid,
    company_data: Option<&str>,
    company_reviews: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET company_data = COALESCE($2, company_data),
            company_reviews = COALESCE($3, company_reviews)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(company_data)
    .bind(company_reviews)
    .execute(pool)
    .await?;
    Ok(())
}

/// `(status, count)` pairs over all jobs.
pub async fn status_counts(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>("SELECT status, COUNT(*) FROM jobs GROUP BY status")
        .fetch_all(pool)
        .await
}

pub async fn insert_note(pool: &PgPool, job_id: Uuid, content: &str) -> Result<NoteRow, sqlx::Error> {
    sqlx::query_as::<_, NoteRow>(
        "INSERT INTO notes (id, job_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// Newest first.
pub async fn list_notes(pool: &PgPool, job_id: Uuid) -> Result<Vec<NoteRow>, sqlx::Error> {
    sqlx::query_as::<_, NoteRow>(
        "SELECT * FROM notes WHERE job_id = $1 ORDER BY date_added DESC",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_note(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_contact(
    pool: &PgPool,
    job_id: Uuid,
    contact: &ContactFields,
) -> Result<ContactRow, sqlx::Error> {
    sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts (id, job_id, name, title, email, phone, linkedin, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(&contact.name)
    .bind(&contact.title)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.linkedin)
    .bind(&contact.notes)
    .fetch_one(pool)
    .await
}

pub async fn list_contacts(pool: &PgPool, job_id: Uuid) -> Result<Vec<ContactRow>, sqlx::Error> {
    sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE job_id = $1 ORDER BY name")
        .bind(job_id)
        .fetch_all(pool)
        .await
}

pub async fn update_contact(
    pool: &PgPool,
    id: Uuid,
    contact: &ContactFields,
) -> Result<Option<ContactRow>, sqlx::Error> {
    sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts
        SET name = $2, title = $3, email = $4, phone = $5, linkedin = $6, notes = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&contact.name)
    .bind(&contact.title)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.linkedin)
    .bind(&contact.notes)
    .fetch_optional(pool)
    .await
}

pub async fn delete_contact(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
