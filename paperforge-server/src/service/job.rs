//! Job Service
//!
//! Owner-scoped reads, listing and deletion of job records.

use paperforge_core::domain::job::JobRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::JobError;
use crate::config::Config;
use crate::repository::JobStore;
use crate::storage::BlobStore;

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const MAX_LIST_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct JobService {
    config: Arc<Config>,
    store: Arc<dyn JobStore>,
    blobs: Arc<dyn BlobStore>,
}

impl JobService {
    pub fn new(config: Arc<Config>, store: Arc<dyn JobStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            config,
            store,
            blobs,
        }
    }

    /// Get a record visible to `owner_id`.
    ///
    /// With public reads enabled the owner is not required and not checked.
    pub async fn get_job(&self, id: Uuid, owner_id: Option<&str>) -> Result<JobRecord, JobError> {
        debug!("Getting generation: {}", id);

        let owner_id = if self.config.public_reads {
            None
        } else {
            Some(self.check_owner(owner_id)?)
        };

        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(JobError::NotFound(id))?;

        match owner_id {
            Some(owner) if record.owner_id != owner => Err(JobError::NotFound(id)),
            _ => Ok(record),
        }
    }

    /// List an owner's records, newest first
    pub async fn list_jobs(
        &self,
        owner_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<JobRecord>, JobError> {
        let owner_id = self.check_owner(Some(owner_id))?;
        let limit = clamp_limit(limit);
        let offset = offset.unwrap_or(0);

        debug!(
            "Listing generations for {} (limit {}, offset {})",
            owner_id, limit, offset
        );

        Ok(self.store.list_by_owner(owner_id, limit, offset).await?)
    }

    /// Delete an owner's record together with its stored objects.
    ///
    /// Objects go first, then the record. The deleted row is checked again
    /// so a result attached by a concurrent finalize is removed as well.
    /// Object deletion is best-effort.
    pub async fn delete_job(&self, id: Uuid, owner_id: Option<&str>) -> Result<(), JobError> {
        let owner_id = self.check_owner(owner_id)?;

        let record = self
            .store
            .find_by_id(id)
            .await?
            .filter(|r| r.owner_id == owner_id)
            .ok_or(JobError::NotFound(id))?;

        self.delete_objects(&record, None).await;

        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or(JobError::NotFound(id))?;
        self.delete_objects(&deleted, Some(&record)).await;

        info!("Generation deleted: {}", id);
        Ok(())
    }

    /// Deletes the objects of `record` not already covered by `done`
    async fn delete_objects(&self, record: &JobRecord, done: Option<&JobRecord>) {
        let keys = std::iter::once(record.source_key.as_str()).chain(record.result_key.as_deref());
        for key in keys {
            let already = done.is_some_and(|d| {
                d.source_key == key || d.result_key.as_deref() == Some(key)
            });
            if already {
                continue;
            }
            if let Err(e) = self.blobs.delete(key).await {
                warn!("Failed to delete object {} of generation {}: {}", key, record.id, e);
            }
        }
    }

    fn check_owner<'a>(&self, owner_id: Option<&'a str>) -> Result<&'a str, JobError> {
        let owner_id = owner_id
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| JobError::validation("User ID is required"))?;
        self.config
            .owner_id_rule
            .check(owner_id)
            .map_err(JobError::Validation)?;
        Ok(owner_id)
    }
}

/// Applies the default and the 1..=100 bounds to a requested page size
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}
