//! Health DTO

use serde::{Deserialize, Serialize};

/// Liveness payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    /// Whether a persistent job record backend is configured
    pub backend_configured: bool,
}
