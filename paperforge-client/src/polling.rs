//! Completion polling
//!
//! Generations finish in the background; clients re-read the record at a
//! fixed interval until it is terminal or the attempt budget runs out.

use std::time::Duration;

use crate::PaperforgeClient;
use crate::error::{ClientError, Result};
use paperforge_core::domain::job::JobRecord;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 180;

/// Polling cadence for [`PaperforgeClient::wait_for_completion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PaperforgeClient {
    /// Poll a generation until it is `completed` or `failed`.
    ///
    /// A failed generation is returned as `Ok`; inspect `status` and
    /// `diagnostic`. Gives up with [`ClientError::Timeout`] after
    /// `max_attempts` reads that all saw `processing`.
    pub async fn wait_for_completion(
        &self,
        id: Uuid,
        user_id: &str,
        options: PollOptions,
    ) -> Result<JobRecord> {
        for attempt in 1..=options.max_attempts {
            let record = self.get_generation(id, user_id).await?;
            if record.status.is_terminal() {
                return Ok(record);
            }

            debug!(
                "Generation {} still processing (attempt {}/{})",
                id, attempt, options.max_attempts
            );
            if attempt < options.max_attempts {
                tokio::time::sleep(options.interval).await;
            }
        }

        Err(ClientError::Timeout {
            id,
            attempts: options.max_attempts,
        })
    }
}
