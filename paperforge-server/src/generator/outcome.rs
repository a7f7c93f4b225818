//! Generator outcome classification
//!
//! The generator writes real errors and harmless warnings to the same stream,
//! so the verdict is made in three tiers:
//! 1. a non-zero exit status always fails,
//! 2. an exit status of 0 fails if any stderr line survives the benign
//!    allow-list,
//! 3. an otherwise successful run still fails if the output file is missing.
//!
//! Unrecognized warning formats are treated as fatal.

use std::path::Path;

/// Patterns used when no allow-list is configured
pub const DEFAULT_BENIGN_PATTERNS: &[&str] = &[
    "warning",
    "deprecationwarning",
    "futurewarning",
    "userwarning",
    "all log messages before absl::initializelog() is called are written to stderr",
    "i0000 ",
    "w0000 ",
];

/// Upper bound on stored diagnostic text
pub const MAX_DIAGNOSTIC_CHARS: usize = 4000;

/// Case-insensitive allow-list of benign stderr lines
#[derive(Debug, Clone)]
pub struct BenignPatterns {
    patterns: Vec<String>,
}

impl BenignPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_benign(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.patterns.iter().any(|p| line.contains(p.as_str()))
    }

    /// Lines of `stderr` that are neither blank nor allow-listed
    pub fn significant_lines<'a>(&self, stderr: &'a str) -> Vec<&'a str> {
        stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .filter(|line| !self.is_benign(line))
            .collect()
    }
}

impl Default for BenignPatterns {
    fn default() -> Self {
        Self::new(DEFAULT_BENIGN_PATTERNS)
    }
}

/// Result of classifying one generator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(String),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

/// Classifies a finished generator run.
///
/// `exit_code` is `None` when the process was terminated by a signal.
pub fn classify(
    exit_code: Option<i32>,
    stderr: &str,
    output_path: &Path,
    patterns: &BenignPatterns,
) -> Verdict {
    let significant = patterns.significant_lines(stderr);

    if exit_code != Some(0) {
        let status = match exit_code {
            Some(code) => format!("Generator exited with status {}", code),
            None => "Generator was terminated by a signal".to_string(),
        };
        let detail = if !significant.is_empty() {
            significant.join("\n")
        } else {
            stderr.trim().to_string()
        };
        return Verdict::Failure(truncate(if detail.is_empty() {
            status
        } else {
            format!("{}: {}", status, detail)
        }));
    }

    if !significant.is_empty() {
        return Verdict::Failure(truncate(significant.join("\n")));
    }

    if !output_path.is_file() {
        return Verdict::Failure(format!(
            "Generator reported success but produced no output file ({})",
            output_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("<unknown>")
        ));
    }

    Verdict::Success
}

/// Truncates on a char boundary, keeping the head of the text
pub fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return text;
    }
    let mut truncated: String = text.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
    truncated.push_str("...");
    truncated
}
