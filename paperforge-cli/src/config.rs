//! Configuration module
//!
//! Handles CLI configuration: server URL and the acting user.

use anyhow::{Result, anyhow};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Paperforge server
    pub server_url: String,
    /// Owner of the generations this CLI works with
    pub user_id: Option<String>,
}

impl Config {
    /// The configured user, required by every generation command
    pub fn user_id(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow!("No user ID given; pass --user or set PAPERFORGE_USER_ID"))
    }
}
