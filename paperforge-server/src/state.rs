//! Shared application state
//!
//! Built once at startup and cloned into every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::generator::Generator;
use crate::repository::JobStore;
use crate::service::{GenerationCoordinator, JobService};
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jobs: JobService,
    pub generations: GenerationCoordinator,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn JobStore>,
        blobs: Arc<dyn BlobStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let config = Arc::new(config);
        let jobs = JobService::new(config.clone(), store.clone(), blobs.clone());
        let generations = GenerationCoordinator::new(config.clone(), store, blobs, generator);
        Self {
            config,
            jobs,
            generations,
        }
    }
}
