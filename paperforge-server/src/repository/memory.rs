//! In-memory job record store
//!
//! Used when no database is configured, and by the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperforge_core::domain::job::{Finalization, JobRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobStore, RepositoryError};

#[derive(Default)]
pub struct InMemoryJobStore {
    records: RwLock<HashMap<Uuid, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, record: &JobRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JobRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut owned: Vec<&JobRecord> = records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(owned
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn finalize(
        &self,
        id: Uuid,
        finalization: Finalization,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) => Ok(record.finalize(finalization, at).is_ok()),
            None => Ok(false),
        }
    }

    async fn fail_stale_processing(
        &self,
        diagnostic: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        let mut updated = 0;
        for record in records.values_mut() {
            let failed = Finalization::Failed {
                diagnostic: diagnostic.to_string(),
            };
            if record.finalize(failed, at).is_ok() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<JobRecord>, RepositoryError> {
        Ok(self.records.write().await.remove(&id))
    }
}
