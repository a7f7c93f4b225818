//! Repository Module
//!
//! Persistence of job records. The server talks to a [`JobStore`]; the
//! Postgres implementation is used when a database URL is configured and the
//! in-memory one otherwise (development and tests).

pub mod job;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperforge_core::domain::job::{Finalization, JobRecord};
use uuid::Uuid;

pub use job::PgJobStore;
pub use memory::InMemoryJobStore;

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt job row {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

/// Job record store
///
/// Trait-based so the services can run against Postgres or memory.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a freshly created record
    async fn insert(&self, record: &JobRecord) -> Result<(), RepositoryError>;

    /// Finds a record by id regardless of owner
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError>;

    /// Lists an owner's records, newest first
    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JobRecord>, RepositoryError>;

    /// Applies the terminal transition.
    ///
    /// Only a record still in `processing` is updated. Returns `false` when
    /// the record is gone or already terminal.
    async fn finalize(
        &self,
        id: Uuid,
        finalization: Finalization,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Marks every record still in `processing` as `failed`.
    ///
    /// Run once at startup, before any continuation exists. Returns the
    /// number of records updated.
    async fn fail_stale_processing(
        &self,
        diagnostic: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Deletes a record and returns it as it was at deletion time.
    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError>;
}
