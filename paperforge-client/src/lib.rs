//! Paperforge HTTP Client
//!
//! A type-safe HTTP client for the Paperforge server API, used by the CLI
//! and usable by any other frontend.
//!
//! # Example
//!
//! ```no_run
//! use paperforge_client::{PaperforgeClient, PollOptions, SubmitOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PaperforgeClient::new("http://localhost:5000");
//!     let owner = "123e4567-e89b-12d3-a456-426614174000";
//!
//!     let bytes = std::fs::read("paper.pdf")?;
//!     let submitted = client
//!         .submit(SubmitOptions::new("paper.pdf", bytes, "podcast", owner))
//!         .await?;
//!
//!     let record = client
//!         .wait_for_completion(submitted.generation_id, owner, PollOptions::default())
//!         .await?;
//!     println!("{}: {:?}", record.status, record.result_url);
//!     Ok(())
//! }
//! ```

pub mod error;
mod generations;
mod polling;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use generations::SubmitOptions;
pub use paperforge_core::domain::job::{JobRecord, JobStatus};
pub use polling::PollOptions;

use paperforge_core::dto::health::HealthResponse;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Paperforge server API
#[derive(Debug, Clone)]
pub struct PaperforgeClient {
    /// Base URL of the server (e.g., "http://localhost:5000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl PaperforgeClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use paperforge_client::PaperforgeClient;
    ///
    /// let client = PaperforgeClient::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check server health
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = PaperforgeClient::new("http://localhost:5000");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = PaperforgeClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = PaperforgeClient::with_client("http://localhost:5000", http_client);
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
