use sqlx::PgPool;
use uuid::Uuid;

use crate::company::discovery::DiscoveredUrls;
use crate::models::company::CompanySourceRow;

/// Most recently updated record for `company_name`. Names are not unique.
pub async fn find_source_by_name(
    pool: &PgPool,
    company_name: &str,
) -> Result<Option<CompanySourceRow>, sqlx::Error> {
    sqlx::query_as::<_, CompanySourceRow>(
        "SELECT * FROM company_sources WHERE company_name = $1 ORDER BY last_updated DESC LIMIT 1",
    )
    .bind(company_name)
    .fetch_optional(pool)
    .await
}

pub async fn insert_source(
    pool: &PgPool,
    company_name: &str,
    urls: &DiscoveredUrls,
) -> Result<CompanySourceRow, sqlx::Error> {
    sqlx::query_as::<_, CompanySourceRow>(
        r#"
        INSERT INTO company_sources (id, company_name, website_url, linkedin_url, glassdoor_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_name)
    .bind(&urls.website_url)
    .bind(&urls.linkedin_url)
    .bind(&urls.glassdoor_url)
    .fetch_one(pool)
    .await
}

/// Sets only the URLs that are currently empty.
pub async fn fill_missing_urls(
    pool: &PgPool,
    id: Uuid,
    urls: &DiscoveredUrls,
) -> Result<CompanySourceRow, sqlx::Error> {
    sqlx::query_as::<_, CompanySourceRow>(
        r#"
        UPDATE company_sources
        SET website_url   = COALESCE(NULLIF(TRIM(website_url), ''), $2),
            linkedin_url  = COALESCE(NULLIF(TRIM(linkedin_url), ''), $3),
            glassdoor_url = COALESCE(NULLIF(TRIM(glassdoor_url), ''), $4),
            last_updated  = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&urls.website_url)
    .bind(&urls.linkedin_url)
    .bind(&urls.glassdoor_url)
    .fetch_one(pool)
    .await
}

/// Overwrites with every URL that is `Some`; the others keep their value.
pub async fn replace_urls(
    pool: &PgPool,
    id: Uuid,
    urls: &DiscoveredUrls,
) -> Result<CompanySourceRow, sqlx::Error> {
    sqlx::query_as::<_, CompanySourceRow>(
        r#"
        UPDATE company_sources
        SET website_url   = COALESCE($2, website_url),
            linkedin_url  = COALESCE($3, linkedin_url),
            glassdoor_url = COALESCE($4, glassdoor_url),
            last_updated  = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&urls.website_url)
    .bind(&urls.linkedin_url)
    .bind(&urls.glassdoor_url)
    .fetch_one(pool)
    .await
}
