//! Service Module
//!
//! Business logic layer of the server. `generation` owns the submit path and
//! the background continuation; `job` serves reads and deletes of existing
//! records.

pub mod generation;
pub mod job;

pub use generation::{GenerationCoordinator, SubmitRequest, UploadedFile};
pub use job::JobService;

use uuid::Uuid;

use crate::generator::GeneratorError;
use crate::repository::RepositoryError;
use crate::storage::StorageError;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Rejected input; nothing was stored
    #[error("{0}")]
    Validation(String),

    #[error("Generation {0} not found")]
    NotFound(Uuid),

    #[error("Generator unavailable: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl JobError {
    pub fn validation(msg: impl Into<String>) -> Self {
        JobError::Validation(msg.into())
    }
}
