//! Job Repository
//!
//! Postgres-backed job record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperforge_core::domain::job::{Finalization, JobKind, JobRecord, JobStatus};
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

use super::{JobStore, RepositoryError};

const SELECT_COLUMNS: &str = r#"
    SELECT id, owner_id, kind, title, source_name, source_key, source_url,
           parameters, status, result_key, result_url, result_size,
           duration, slides, diagnostic, created_at, updated_at
    FROM jobs
"#;

/// Job store on a Postgres pool
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn insert(&self, record: &JobRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, owner_id, kind, title, source_name, source_key,
                              source_url, parameters, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(record.kind.as_str())
        .bind(&record.title)
        .bind(&record.source_name)
        .bind(&record.source_key)
        .bind(&record.source_url)
        .bind(Json(&record.parameters))
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobRecord::try_from).transpose()
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JobRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobRecord::try_from).collect()
    }

    async fn finalize(
        &self,
        id: Uuid,
        finalization: Finalization,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let status = finalization.status();
        let (result_key, result_url, result_size, duration, slides, diagnostic) =
            match finalization {
                Finalization::Completed {
                    result_key,
                    result_url,
                    result_size,
                    duration,
                    slides,
                } => (
                    Some(result_key),
                    Some(result_url),
                    Some(i64::try_from(result_size).unwrap_or(i64::MAX)),
                    duration,
                    slides,
                    None,
                ),
                Finalization::Failed { diagnostic } => {
                    (None, None, None, None, None, Some(diagnostic))
                }
            };

        // Conditional on processing: a terminal record is never rewritten
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, result_key = $2, result_url = $3, result_size = $4,
                duration = $5, slides = $6, diagnostic = $7, updated_at = $8
            WHERE id = $9 AND status = $10
            "#,
        )
        .bind(status.as_str())
        .bind(result_key)
        .bind(result_url)
        .bind(result_size)
        .bind(duration)
        .bind(slides)
        .bind(diagnostic)
        .bind(at)
        .bind(id)
        .bind(JobStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn fail_stale_processing(
        &self,
        diagnostic: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $1, diagnostic = $2, updated_at = $3
            WHERE status = $4
            "#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(diagnostic)
        .bind(at)
        .bind(JobStatus::Processing.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            DELETE FROM jobs WHERE id = $1
            RETURNING id, owner_id, kind, title, source_name, source_key, source_url,
                      parameters, status, result_key, result_url, result_size,
                      duration, slides, diagnostic, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobRecord::try_from).transpose()
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    owner_id: String,
    kind: String,
    title: String,
    source_name: String,
    source_key: String,
    source_url: String,
    parameters: Json<HashMap<String, serde_json::Value>>,
    status: String,
    result_key: Option<String>,
    result_url: Option<String>,
    result_size: Option<i64>,
    duration: Option<String>,
    slides: Option<String>,
    diagnostic: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for JobRecord {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<JobKind>()
            .map_err(|e| RepositoryError::Corrupt {
                id: row.id,
                reason: e.to_string(),
            })?;
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|reason| RepositoryError::Corrupt { id: row.id, reason })?;

        Ok(JobRecord {
            id: row.id,
            owner_id: row.owner_id,
            kind,
            title: row.title,
            source_name: row.source_name,
            source_key: row.source_key,
            source_url: row.source_url,
            parameters: row.parameters.0,
            status,
            result_key: row.result_key,
            result_url: row.result_url,
            result_size: row.result_size.and_then(|s| u64::try_from(s).ok()),
            duration: row.duration,
            slides: row.slides,
            diagnostic: row.diagnostic,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
