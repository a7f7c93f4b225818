//! Generator process
//!
//! Launches the external slide-deck / podcast generator and captures its
//! exit status and output streams. Interpreting the result is left to
//! [`outcome::classify`].

pub mod outcome;

use async_trait::async_trait;
use paperforge_core::domain::job::JobKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::GeneratorConfig;

/// Errors raised before a generator run produced an exit status
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator script {0} not found")]
    ScriptMissing(PathBuf),

    #[error("failed to launch generator: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Captured result of one generator run
#[derive(Debug, Clone)]
pub struct GeneratorRun {
    /// `None` when terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the generator for a kind
#[async_trait]
pub trait Generator: Send + Sync {
    /// Checks that the generator for `kind` can be launched at all
    fn check_available(&self, kind: JobKind) -> Result<(), GeneratorError>;

    /// Runs the generator to completion
    ///
    /// # Arguments
    /// * `kind` - Selects the generator variant
    /// * `source` - Local path of the uploaded PDF
    /// * `output` - Local path the generator must write its artifact to
    /// * `args` - Kind-specific arguments following the two paths
    async fn run(
        &self,
        kind: JobKind,
        source: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<GeneratorRun, GeneratorError>;
}

/// Generator launched as `<interpreter> <script> <source> <output> <args...>`
pub struct ProcessGenerator {
    config: GeneratorConfig,
}

impl ProcessGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    fn script(&self, kind: JobKind) -> &Path {
        match kind {
            JobKind::SlideDeck => &self.config.slide_deck_script,
            JobKind::Podcast => &self.config.podcast_script,
        }
    }
}

#[async_trait]
impl Generator for ProcessGenerator {
    fn check_available(&self, kind: JobKind) -> Result<(), GeneratorError> {
        let script = self.script(kind);
        if script.is_file() {
            Ok(())
        } else {
            Err(GeneratorError::ScriptMissing(script.to_path_buf()))
        }
    }

    async fn run(
        &self,
        kind: JobKind,
        source: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<GeneratorRun, GeneratorError> {
        let script = self.script(kind);

        debug!(
            "Executing generator: {} {} {:?}",
            self.config.interpreter,
            script.display(),
            args
        );

        let result = Command::new(&self.config.interpreter)
            .arg(script)
            .arg(source)
            .arg(output)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(GeneratorRun {
            exit_code: result.status.code(),
            stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        })
    }
}
