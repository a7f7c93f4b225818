//! Server configuration
//!
//! Defines every tunable of the server: bind address, job record backend,
//! blob storage location, scratch directories, generator invocation and the
//! benign-diagnostic allow-list.

use anyhow::Context;
use std::path::{Path, PathBuf};

use crate::generator::outcome::DEFAULT_BENIGN_PATTERNS;

/// Server configuration
///
/// Built once at startup and shared read-only by every request and
/// background job.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to (e.g., "0.0.0.0:5000")
    pub bind_addr: String,

    /// Postgres URL for the job record store; in-memory store when unset
    pub database_url: Option<String>,

    /// Public base URL used to build blob URLs (e.g., "http://localhost:5000")
    pub public_url: String,

    /// Root directory of the filesystem blob store
    pub storage_dir: PathBuf,

    /// Scratch directory for incoming uploads
    pub upload_dir: PathBuf,

    /// Scratch directory for raw generator output
    pub output_dir: PathBuf,

    /// How to launch the generator process
    pub generator: GeneratorConfig,

    /// Max generator processes running at once
    pub max_parallel_jobs: usize,

    /// Max accepted request body size for uploads
    pub max_upload_bytes: usize,

    /// Accepted format of owner ids
    pub owner_id_rule: OwnerIdRule,

    /// Serve job records without owner scoping (share links)
    pub public_reads: bool,

    /// Case-insensitive patterns of stderr lines that do not indicate failure
    pub benign_patterns: Vec<String>,
}

/// Generator invocation settings
///
/// The generator is run as `<interpreter> <script> <args...>`.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub interpreter: String,
    pub slide_deck_script: PathBuf,
    pub podcast_script: PathBuf,
}

/// Rule applied to the `userId` of every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerIdRule {
    /// 36-character hyphenated UUID
    Uuid,
    /// Any id of 1-128 letters, digits, '-' or '_'
    Opaque,
}

impl OwnerIdRule {
    pub fn check(&self, owner_id: &str) -> Result<(), String> {
        match self {
            OwnerIdRule::Uuid => {
                if owner_id.len() == 36 && uuid::Uuid::parse_str(owner_id).is_ok() {
                    Ok(())
                } else {
                    Err("Invalid user ID format".to_string())
                }
            }
            OwnerIdRule::Opaque => {
                let valid = !owner_id.is_empty()
                    && owner_id.len() <= 128
                    && owner_id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if valid {
                    Ok(())
                } else {
                    Err("Invalid user ID format".to_string())
                }
            }
        }
    }
}

impl std::str::FromStr for OwnerIdRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(OwnerIdRule::Uuid),
            "opaque" => Ok(OwnerIdRule::Opaque),
            other => anyhow::bail!("unknown owner id rule '{}' (expected uuid or opaque)", other),
        }
    }
}

impl Config {
    /// Creates a configuration with defaults, keeping all data under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            database_url: None,
            public_url: "http://localhost:5000".to_string(),
            storage_dir: data_dir.join("storage"),
            upload_dir: data_dir.join("uploads"),
            output_dir: data_dir.join("outputs"),
            generator: GeneratorConfig {
                interpreter: "python3".to_string(),
                slide_deck_script: PathBuf::from("scripts/generate_ppt.py"),
                podcast_script: PathBuf::from("scripts/generate_podcast.py"),
            },
            max_parallel_jobs: 2,
            max_upload_bytes: 50 * 1024 * 1024,
            owner_id_rule: OwnerIdRule::Uuid,
            public_reads: false,
            benign_patterns: DEFAULT_BENIGN_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - PAPERFORGE_BIND_ADDR (default: 0.0.0.0:5000)
    /// - DATABASE_URL (default: unset, in-memory store)
    /// - PAPERFORGE_PUBLIC_URL (default: http://localhost:5000)
    /// - PAPERFORGE_DATA_DIR (default: ./data)
    /// - PAPERFORGE_STORAGE_DIR / PAPERFORGE_UPLOAD_DIR / PAPERFORGE_OUTPUT_DIR
    /// - PAPERFORGE_INTERPRETER (default: python3)
    /// - PAPERFORGE_SLIDE_DECK_SCRIPT / PAPERFORGE_PODCAST_SCRIPT
    /// - PAPERFORGE_MAX_PARALLEL_JOBS (default: 2)
    /// - PAPERFORGE_MAX_UPLOAD_MB (default: 50)
    /// - PAPERFORGE_OWNER_ID_RULE (uuid|opaque, default: uuid)
    /// - PAPERFORGE_PUBLIC_READS (default: false)
    /// - PAPERFORGE_BENIGN_PATTERNS (comma-separated) or
    ///   PAPERFORGE_BENIGN_PATTERNS_FILE (one pattern per line)
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env("PAPERFORGE_DATA_DIR").unwrap_or_else(|| "data".to_string());
        let mut config = Self::new(data_dir);

        if let Some(addr) = env("PAPERFORGE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.database_url = env("DATABASE_URL");
        if let Some(url) = env("PAPERFORGE_PUBLIC_URL") {
            config.public_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = env("PAPERFORGE_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env("PAPERFORGE_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env("PAPERFORGE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(interpreter) = env("PAPERFORGE_INTERPRETER") {
            config.generator.interpreter = interpreter;
        }
        if let Some(script) = env("PAPERFORGE_SLIDE_DECK_SCRIPT") {
            config.generator.slide_deck_script = PathBuf::from(script);
        }
        if let Some(script) = env("PAPERFORGE_PODCAST_SCRIPT") {
            config.generator.podcast_script = PathBuf::from(script);
        }

        if let Some(jobs) = env("PAPERFORGE_MAX_PARALLEL_JOBS") {
            config.max_parallel_jobs = jobs
                .trim()
                .parse()
                .with_context(|| format!("Invalid PAPERFORGE_MAX_PARALLEL_JOBS: {}", jobs))?;
        }

        if let Some(mb) = env("PAPERFORGE_MAX_UPLOAD_MB") {
            config.max_upload_bytes = upload_limit_bytes(&mb)
                .with_context(|| format!("Invalid PAPERFORGE_MAX_UPLOAD_MB: {}", mb))?;
        }

        if let Some(rule) = env("PAPERFORGE_OWNER_ID_RULE") {
            config.owner_id_rule = rule.parse()?;
        }

        config.public_reads = env("PAPERFORGE_PUBLIC_READS")
            .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        if let Some(path) = env("PAPERFORGE_BENIGN_PATTERNS_FILE") {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                anyhow::anyhow!("Failed to read benign pattern file {}: {}", path, e)
            })?;
            config.benign_patterns = parse_pattern_lines(&contents);
        } else if let Some(list) = env("PAPERFORGE_BENIGN_PATTERNS") {
            config.benign_patterns = list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            anyhow::bail!("public_url must start with http:// or https://");
        }

        if self.generator.interpreter.is_empty() {
            anyhow::bail!("generator interpreter cannot be empty");
        }

        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than 0");
        }

        if self.upload_dir == self.output_dir {
            anyhow::bail!("upload_dir and output_dir must differ");
        }

        Ok(())
    }

    /// URL prefix under which stored objects are served
    pub fn files_url(&self) -> String {
        format!("{}/files", self.public_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("data")
    }
}

/// Converts a megabyte count to bytes
fn upload_limit_bytes(mb: &str) -> anyhow::Result<usize> {
    let mb: usize = mb.trim().parse()?;
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} MB does not fit in memory limits", mb))
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// One pattern per line; blank lines and `#` comments are skipped
fn parse_pattern_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
