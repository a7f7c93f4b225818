//! Generation endpoints

use crate::PaperforgeClient;
use crate::error::{ClientError, Result};
use paperforge_core::domain::job::JobRecord;
use paperforge_core::dto::job::{DeleteGeneration, MessageResponse, SubmitResponse};
use reqwest::multipart::{Form, Part};
use uuid::Uuid;

/// Fields of one upload
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Declared media type of the file (default: application/pdf)
    pub content_type: String,
    /// `slide_deck` / `presentation` / `ppt` / `podcast`
    pub output_type: String,
    pub user_id: String,
    /// Per-kind settings object, sent as JSON text
    pub settings: Option<serde_json::Value>,
}

impl SubmitOptions {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        output_type: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: "application/pdf".to_string(),
            output_type: output_type.into(),
            user_id: user_id.into(),
            settings: None,
        }
    }

    pub fn settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = Some(settings);
        self
    }

    fn into_form(self) -> Result<Form> {
        let file = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid content type: {}", e)))?;

        let mut form = Form::new()
            .part("file", file)
            .text("outputType", self.output_type)
            .text("userId", self.user_id);
        if let Some(settings) = self.settings {
            form = form.text("settings", settings.to_string());
        }
        Ok(form)
    }
}

impl PaperforgeClient {
    /// Upload a PDF and start a generation
    ///
    /// Returns as soon as the server has accepted the job; use
    /// [`PaperforgeClient::wait_for_completion`] to observe the outcome.
    pub async fn submit(&self, options: SubmitOptions) -> Result<SubmitResponse> {
        let url = format!("{}/api/upload", self.base_url);
        let form = options.into_form()?;
        let response = self.client.post(&url).multipart(form).send().await?;

        self.handle_response(response).await
    }

    /// Get a generation owned by `user_id`
    pub async fn get_generation(&self, id: Uuid, user_id: &str) -> Result<JobRecord> {
        let url = format!("{}/api/generation/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List a user's generations, newest first
    ///
    /// # Arguments
    /// * `limit` - Page size (server default 50, max 100)
    /// * `offset` - Records to skip
    pub async fn list_generations(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<JobRecord>> {
        let url = format!("{}/api/user/{}/generations", self.base_url, user_id);
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }
        let response = self.client.get(&url).query(&query).send().await?;

        self.handle_response(response).await
    }

    /// Delete a generation and its stored files
    pub async fn delete_generation(&self, id: Uuid, user_id: &str) -> Result<MessageResponse> {
        let url = format!("{}/api/generation/{}", self.base_url, id);
        let response = self
            .client
            .delete(&url)
            .json(&DeleteGeneration {
                user_id: user_id.to_string(),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_options_defaults() {
        let options = SubmitOptions::new("paper.pdf", vec![1, 2], "podcast", "u1")
            .settings(serde_json::json!({"quality": "high"}));
        assert_eq!(options.content_type, "application/pdf");
        assert_eq!(options.settings.unwrap()["quality"], "high");
    }

    #[test]
    fn test_invalid_content_type_is_rejected() {
        let mut options = SubmitOptions::new("paper.pdf", vec![1], "podcast", "u1");
        options.content_type = "not a mime type".to_string();
        assert!(matches!(
            options.into_form(),
            Err(ClientError::InvalidRequest(_))
        ));
    }
}
