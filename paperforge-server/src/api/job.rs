//! Generation API Handlers
//!
//! HTTP endpoints for submitting, polling, listing and deleting generations.

use axum::{
    Json,
    extract::{Multipart, State},
};
use paperforge_core::domain::job::JobRecord;
use paperforge_core::dto::job::{
    DeleteGeneration, GetGenerationQuery, ListQuery, MessageResponse, SubmitResponse,
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::service::{SubmitRequest, UploadedFile};
use crate::state::AppState;

/// POST /api/upload
/// Accept a PDF and start generating the requested artifact
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    let mut request = SubmitRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                request.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some(key @ ("outputType" | "userId" | "settings")) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", key, e)))?;
                match key {
                    "outputType" => request.output_type = Some(text),
                    "userId" => request.owner_id = Some(text),
                    _ => request.settings = Some(text),
                }
            }
            _ => {}
        }
    }

    tracing::info!(
        "Upload received: output type {:?}, user {:?}",
        request.output_type,
        request.owner_id
    );

    let record = state.generations.submit(request).await?;

    Ok(Json(SubmitResponse {
        message: "File uploaded successfully, generation started".to_string(),
        generation_id: record.id,
        status: record.status,
    }))
}

/// GET /api/generation/{id}?userId=
pub async fn get_generation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<GetGenerationQuery>,
) -> ApiResult<Json<JobRecord>> {
    let record = state
        .jobs
        .get_job(id, query.user_id.as_deref())
        .await?;
    Ok(Json(record))
}

/// GET /api/user/{userId}/generations?limit=&offset=
pub async fn list_generations(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<JobRecord>>> {
    let records = state
        .jobs
        .list_jobs(&user_id, query.limit, query.offset)
        .await?;
    Ok(Json(records))
}

/// DELETE /api/generation/{id}
/// Body: `{"userId": "..."}`
pub async fn delete_generation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<DeleteGeneration>,
) -> ApiResult<Json<MessageResponse>> {
    state.jobs.delete_job(id, Some(&body.user_id)).await?;
    Ok(Json(MessageResponse {
        message: "Generation deleted successfully".to_string(),
    }))
}
