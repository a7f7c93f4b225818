//! Generation Coordinator
//!
//! Accepts a submission, persists the source and the record, and runs the
//! generator in a spawned task. The submit call returns as soon as the record
//! exists; the task later applies the single terminal transition.

use chrono::Utc;
use paperforge_core::domain::job::{Finalization, JobKind, JobRecord};
use paperforge_core::domain::settings::{GenerationSettings, parse_parameters};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::JobError;
use crate::config::Config;
use crate::generator::Generator;
use crate::generator::outcome::{self, BenignPatterns, Verdict};
use crate::repository::{JobStore, RepositoryError};
use crate::storage::{BlobStore, StorageError, StoredObject, keys};

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Millisecond steps tried past a taken key before giving up
const MAX_KEY_BUMPS: i64 = 1000;

const FINALIZE_ATTEMPTS: u32 = 4;
const FINALIZE_BACKOFF: Duration = Duration::from_millis(100);

/// Diagnostic of records whose continuation died with the previous process
pub const INTERRUPTED_DIAGNOSTIC: &str = "Generation interrupted by server restart";

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Raw submission fields, validated by [`GenerationCoordinator::submit`]
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub file: Option<UploadedFile>,
    pub output_type: Option<String>,
    pub owner_id: Option<String>,
    /// JSON object text; anything unparseable counts as empty
    pub settings: Option<String>,
}

/// Everything the background continuation needs
struct PendingGeneration {
    id: Uuid,
    owner_id: String,
    kind: JobKind,
    settings: GenerationSettings,
    source_path: PathBuf,
    timestamp_ms: i64,
}

#[derive(Clone)]
pub struct GenerationCoordinator {
    config: Arc<Config>,
    store: Arc<dyn JobStore>,
    blobs: Arc<dyn BlobStore>,
    generator: Arc<dyn Generator>,
    patterns: Arc<BenignPatterns>,
    semaphore: Arc<Semaphore>,
}

impl GenerationCoordinator {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn JobStore>,
        blobs: Arc<dyn BlobStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let patterns = Arc::new(BenignPatterns::new(&config.benign_patterns));
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_jobs));
        Self {
            config,
            store,
            blobs,
            generator,
            patterns,
            semaphore,
        }
    }

    /// Validates and accepts a submission.
    ///
    /// Every check runs before the first side effect, so a rejected request
    /// leaves neither a stored object nor a record behind. The returned record
    /// is still `processing`; generation continues in a spawned task.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobRecord, JobError> {
        let file = request
            .file
            .ok_or_else(|| JobError::validation("No file uploaded"))?;

        let is_pdf = file
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE));
        if !is_pdf {
            return Err(JobError::validation("Only PDF files are allowed"));
        }
        if file.bytes.is_empty() {
            return Err(JobError::validation("Uploaded file is empty"));
        }

        let kind = request
            .output_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| JobError::validation("Output type is required"))?
            .parse::<JobKind>()
            .map_err(|e| JobError::validation(format!("Invalid output type: {}", e.0)))?;

        let owner_id = request
            .owner_id
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| JobError::validation("User ID is required"))?
            .to_string();
        self.config
            .owner_id_rule
            .check(&owner_id)
            .map_err(JobError::Validation)?;

        let parameters = parse_parameters(request.settings.as_deref());
        let settings = GenerationSettings::from_parameters(kind, &parameters)
            .map_err(|e| JobError::validation(e.to_string()))?;

        self.generator.check_available(kind)?;

        // Side effects start here
        let timestamp_ms = Utc::now().timestamp_millis();
        let id_hint = Uuid::new_v4();
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(StorageError::from)?;
        let source_path = self
            .config
            .upload_dir
            .join(format!("{}_{}.pdf", timestamp_ms, id_hint));
        if let Err(e) = tokio::fs::write(&source_path, &file.bytes).await {
            remove_scratch(&source_path).await;
            return Err(StorageError::from(e).into());
        }

        let source = match self
            .put_unique(timestamp_ms, &file.bytes, |ts| {
                keys::source_key(&owner_id, ts, &file.file_name)
            })
            .await
        {
            Ok(object) => object,
            Err(e) => {
                error!("Failed to store source of {}: {}", file.file_name, e);
                remove_scratch(&source_path).await;
                return Err(e.into());
            }
        };

        let record = JobRecord::new(
            owner_id.clone(),
            kind,
            file.file_name,
            source.key,
            source.url,
            parameters,
        );
        if let Err(e) = self.store.insert(&record).await {
            error!("Failed to create generation record: {}", e);
            remove_scratch(&source_path).await;
            if let Err(e) = self.blobs.delete(&record.source_key).await {
                warn!("Failed to remove orphaned source {}: {}", record.source_key, e);
            }
            return Err(e.into());
        }

        info!(
            "Generation created: {} ({} for {})",
            record.id, record.kind, record.owner_id
        );

        self.spawn_generation(PendingGeneration {
            id: record.id,
            owner_id,
            kind,
            settings,
            source_path,
            timestamp_ms,
        });

        Ok(record)
    }

    /// Spawns the continuation; the caller never awaits it
    fn spawn_generation(&self, pending: PendingGeneration) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let permit = match coordinator.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Worker pool closed, generation {} not run: {}", pending.id, e);
                    remove_scratch(&pending.source_path).await;
                    return;
                }
            };
            coordinator.run_generation(pending).await;
            drop(permit);
        });
    }

    /// Runs the generator, stores the artifact and finalizes the record
    async fn run_generation(&self, pending: PendingGeneration) {
        let id = pending.id;
        info!("Starting generation {}", id);

        let output_path = self.config.output_dir.join(format!(
            "{}_{}.{}",
            pending.timestamp_ms,
            id,
            pending.kind.extension()
        ));

        let finalization = self.generate(&pending, &output_path).await;
        let uploaded_key = match &finalization {
            Finalization::Completed { result_key, .. } => Some(result_key.clone()),
            Finalization::Failed { diagnostic } => {
                warn!("Generation {} failed: {}", id, diagnostic);
                None
            }
        };
        let status = finalization.status();

        let discard = match self.finalize_with_retry(id, finalization).await {
            Ok(true) => {
                info!("Generation {} finished with status: {}", id, status);
                false
            }
            Ok(false) => {
                warn!(
                    "Generation {} was deleted or already final, discarding result",
                    id
                );
                true
            }
            Err(e) => {
                error!(
                    "Giving up on finalizing generation {}, left for the startup sweep: {}",
                    id, e
                );
                true
            }
        };
        if let Some(key) = uploaded_key.filter(|_| discard) {
            if let Err(e) = self.blobs.delete(&key).await {
                warn!("Failed to remove discarded result {}: {}", key, e);
            }
        }

        remove_scratch(&pending.source_path).await;
        remove_scratch(&output_path).await;
    }

    async fn generate(&self, pending: &PendingGeneration, output_path: &Path) -> Finalization {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.output_dir).await {
            return failed(format!("Failed to prepare output directory: {}", e));
        }

        let args = pending.settings.generator_args();
        let run = match self
            .generator
            .run(pending.kind, &pending.source_path, output_path, &args)
            .await
        {
            Ok(run) => run,
            Err(e) => return failed(format!("Failed to launch generator: {}", e)),
        };

        if !run.stdout.trim().is_empty() {
            debug!("Generator output for {}: {}", pending.id, run.stdout.trim());
        }

        if let Verdict::Failure(diagnostic) =
            outcome::classify(run.exit_code, &run.stderr, output_path, &self.patterns)
        {
            return failed(diagnostic);
        }

        let data = match tokio::fs::read(output_path).await {
            Ok(data) => data,
            Err(e) => return failed(format!("Failed to read generated file: {}", e)),
        };
        let stored = self
            .put_unique(Utc::now().timestamp_millis(), &data, |ts| {
                keys::result_key(&pending.owner_id, pending.kind, ts)
            })
            .await;
        match stored {
            Ok(object) => Finalization::Completed {
                result_key: object.key,
                result_url: object.url,
                result_size: object.size,
                duration: pending.settings.duration_bucket(),
                slides: pending.settings.slide_bucket(),
            },
            Err(e) => failed(format!("Failed to upload generated file: {}", e)),
        }
    }

    /// Stores `data` under the first free key, starting at `timestamp_ms`
    /// and moving one millisecond forward per taken key.
    async fn put_unique(
        &self,
        timestamp_ms: i64,
        data: &[u8],
        key_for: impl Fn(i64) -> String,
    ) -> Result<StoredObject, StorageError> {
        let mut ts = timestamp_ms;
        loop {
            match self.blobs.put(&key_for(ts), data).await {
                Err(StorageError::AlreadyExists(key)) if ts - timestamp_ms < MAX_KEY_BUMPS => {
                    debug!("Blob key {} taken, trying the next millisecond", key);
                    ts += 1;
                }
                other => return other,
            }
        }
    }

    /// Applies the terminal transition, retrying store errors with backoff
    async fn finalize_with_retry(
        &self,
        id: Uuid,
        finalization: Finalization,
    ) -> Result<bool, RepositoryError> {
        let mut backoff = FINALIZE_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.store.finalize(id, finalization.clone(), Utc::now()).await {
                Err(e) if attempt < FINALIZE_ATTEMPTS => {
                    warn!(
                        "Finalizing generation {} failed (attempt {}/{}): {}",
                        id, attempt, FINALIZE_ATTEMPTS, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Fails records left `processing` by a previous server process.
    ///
    /// Must run before the first submission is accepted.
    pub async fn recover_interrupted(&self) -> Result<u64, JobError> {
        let updated = self
            .store
            .fail_stale_processing(INTERRUPTED_DIAGNOSTIC, Utc::now())
            .await?;
        if updated > 0 {
            warn!("Marked {} interrupted generation(s) as failed", updated);
        }
        Ok(updated)
    }
}

fn failed(diagnostic: String) -> Finalization {
    Finalization::Failed {
        diagnostic: outcome::truncate(diagnostic),
    }
}

/// Best-effort removal of a scratch file
async fn remove_scratch(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
    }
}
