//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Job record
///
/// One user-submitted request to turn a source PDF into a derivative
/// artifact. Created as `Processing`, finalized at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: JobKind,
    pub title: String,
    pub source_name: String,
    pub source_key: String,
    pub source_url: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_size: Option<u64>,
    /// Approximate podcast length bucket, e.g. "8-12 min"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Approximate slide count bucket, e.g. "10-15"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a fresh `Processing` record with a new id.
    ///
    /// The title defaults to the source filename without its extension.
    pub fn new(
        owner_id: impl Into<String>,
        kind: JobKind,
        source_name: impl Into<String>,
        source_key: impl Into<String>,
        source_url: impl Into<String>,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Self {
        let source_name = source_name.into();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.into(),
            kind,
            title: title_from_filename(&source_name),
            source_name,
            source_key: source_key.into(),
            source_url: source_url.into(),
            parameters,
            status: JobStatus::Processing,
            result_key: None,
            result_url: None,
            result_size: None,
            duration: None,
            slides: None,
            diagnostic: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the single terminal transition.
    ///
    /// Fails without touching the record if it already left `Processing`.
    pub fn finalize(
        &mut self,
        finalization: Finalization,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                id: self.id,
                current: self.status,
            });
        }

        match finalization {
            Finalization::Completed {
                result_key,
                result_url,
                result_size,
                duration,
                slides,
            } => {
                self.status = JobStatus::Completed;
                self.result_key = Some(result_key);
                self.result_url = Some(result_url);
                self.result_size = Some(result_size);
                self.duration = duration;
                self.slides = slides;
                self.diagnostic = None;
            }
            Finalization::Failed { diagnostic } => {
                self.status = JobStatus::Failed;
                self.result_key = None;
                self.result_url = None;
                self.result_size = None;
                self.diagnostic = Some(diagnostic);
            }
        }
        self.updated_at = at;

        Ok(())
    }
}

/// Requested artifact type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    SlideDeck,
    Podcast,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::SlideDeck => "slide_deck",
            JobKind::Podcast => "podcast",
        }
    }

    /// File extension of the generated artifact
    pub fn extension(&self) -> &'static str {
        match self {
            JobKind::SlideDeck => "pptx",
            JobKind::Podcast => "mp3",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = UnknownKind;

    /// Accepts the canonical names plus the labels older clients send
    /// ("presentation", "PPT", "Podcast").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slide_deck" | "slidedeck" | "presentation" | "ppt" => Ok(JobKind::SlideDeck),
            "podcast" => Ok(JobKind::Podcast),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Returned when an output type names no known kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized output type: {0}")]
pub struct UnknownKind(pub String);

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {}", other)),
        }
    }
}

/// Terminal outcome written to a record when its generation finishes
#[derive(Debug, Clone, PartialEq)]
pub enum Finalization {
    Completed {
        result_key: String,
        result_url: String,
        result_size: u64,
        duration: Option<String>,
        slides: Option<String>,
    },
    Failed {
        diagnostic: String,
    },
}

impl Finalization {
    pub fn status(&self) -> JobStatus {
        match self {
            Finalization::Completed { .. } => JobStatus::Completed,
            Finalization::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Attempt to move a record out of a terminal status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {id} is already {current}")]
pub struct TransitionError {
    pub id: Uuid,
    pub current: JobStatus,
}

fn title_from_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let stem = match base.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => base,
    }
    .trim();

    if stem.is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: JobKind) -> JobRecord {
        JobRecord::new(
            "owner",
            kind,
            "Attention Is All You Need.pdf",
            "owner/1_paper.pdf",
            "http://localhost/files/owner/1_paper.pdf",
            HashMap::new(),
        )
    }

    fn completed() -> Finalization {
        Finalization::Completed {
            result_key: "owner/podcast_2.mp3".to_string(),
            result_url: "http://localhost/files/owner/podcast_2.mp3".to_string(),
            result_size: 1024,
            duration: Some("8-12 min".to_string()),
            slides: None,
        }
    }

    fn failed() -> Finalization {
        Finalization::Failed {
            diagnostic: "Traceback: boom".to_string(),
        }
    }

    fn assert_terminal_invariant(job: &JobRecord) {
        match job.status {
            JobStatus::Completed => {
                assert!(job.result_url.is_some());
                assert!(job.result_size.is_some());
                assert!(job.diagnostic.is_none());
            }
            JobStatus::Failed => {
                assert!(job.diagnostic.is_some());
                assert!(job.result_url.is_none());
                assert!(job.result_size.is_none());
            }
            JobStatus::Processing => {
                assert!(job.result_url.is_none());
                assert!(job.diagnostic.is_none());
            }
        }
    }

    #[test]
    fn test_new_record_is_processing() {
        let job = record(JobKind::Podcast);
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.title, "Attention Is All You Need");
        assert_eq!(job.created_at, job.updated_at);
        assert_terminal_invariant(&job);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(record(JobKind::Podcast).id, record(JobKind::Podcast).id);
    }

    #[test]
    fn test_title_falls_back_for_empty_stem() {
        let job = JobRecord::new("o", JobKind::SlideDeck, ".pdf", "k", "u", HashMap::new());
        assert_eq!(job.title, "Untitled");

        assert_eq!(title_from_filename("  .pdf  "), "Untitled");
        assert_eq!(title_from_filename(""), "Untitled");
        assert_eq!(title_from_filename("notes"), "notes");
        assert_eq!(title_from_filename("v1.2 draft.pdf"), "v1.2 draft");
        assert_eq!(title_from_filename("dir/sub\\paper.pdf"), "paper");
    }

    #[test]
    fn test_finalize_completed() {
        let mut job = record(JobKind::Podcast);
        let later = job.created_at + chrono::Duration::seconds(5);
        job.finalize(completed(), later).unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.updated_at, later);
        assert_eq!(job.duration.as_deref(), Some("8-12 min"));
        assert_terminal_invariant(&job);
    }

    #[test]
    fn test_finalize_failed() {
        let mut job = record(JobKind::SlideDeck);
        job.finalize(failed(), Utc::now()).unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_terminal_invariant(&job);
    }

    #[test]
    fn test_terminal_status_is_final() {
        for (first, second) in [
            (completed(), failed()),
            (failed(), completed()),
            (completed(), completed()),
            (failed(), failed()),
        ] {
            let mut job = record(JobKind::Podcast);
            let first_status = first.status();
            job.finalize(first, Utc::now()).unwrap();
            let snapshot = job.clone();

            let err = job.finalize(second, Utc::now()).unwrap_err();
            assert_eq!(err.current, first_status);
            assert_eq!(job, snapshot);
            assert_terminal_invariant(&job);
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("podcast".parse::<JobKind>().unwrap(), JobKind::Podcast);
        assert_eq!("Podcast".parse::<JobKind>().unwrap(), JobKind::Podcast);
        assert_eq!("PPT".parse::<JobKind>().unwrap(), JobKind::SlideDeck);
        assert_eq!("presentation".parse::<JobKind>().unwrap(), JobKind::SlideDeck);
        assert_eq!("slide_deck".parse::<JobKind>().unwrap(), JobKind::SlideDeck);
        assert!("Poster".parse::<JobKind>().is_err());
        assert!("".parse::<JobKind>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [JobStatus::Processing, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("Queued".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record(JobKind::SlideDeck)).unwrap();
        assert_eq!(json["kind"], "slide_deck");
        assert_eq!(json["status"], "processing");
        assert!(json.get("result_url").is_none());
        assert!(json.get("diagnostic").is_none());
    }
}
