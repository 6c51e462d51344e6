use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::documents::UploadedDocument;
use crate::errors::AppError;
use crate::interview::models::ContactInfo;
use crate::interview::view::{SavedSessionSummary, SessionView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DraftRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Serialize)]
pub struct SavedSessionResponse {
    pub saved: Option<SavedSessionSummary>,
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.controller.view().await)
}

/// GET /api/v1/session/saved
pub async fn handle_get_saved(State(state): State<AppState>) -> Json<SavedSessionResponse> {
    Json(SavedSessionResponse {
        saved: state.controller.saved_session().await,
    })
}

/// POST /api/v1/session/upload
/// Multipart form with a single `file` part (PDF or DOCX).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        info!("Received upload '{}' ({} bytes)", file_name, data.len());
        let doc = UploadedDocument::new(file_name, content_type, data);
        return Ok(Json(state.controller.upload_document(doc).await?));
    }
    Err(AppError::Validation("Missing 'file' field".to_string()))
}

/// POST /api/v1/session/info
pub async fn handle_submit_info(
    State(state): State<AppState>,
    Json(contact): Json<ContactInfo>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.controller.submit_manual_info(contact).await?))
}

/// PUT /api/v1/session/draft
pub async fn handle_update_draft(
    State(state): State<AppState>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.controller.update_draft(req.text).await?))
}

/// POST /api/v1/session/answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.controller.submit_answer(req.answer).await?))
}

/// POST /api/v1/session/resume
pub async fn handle_resume(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.controller.resume_saved().await?))
}

/// POST /api/v1/session/reset
pub async fn handle_reset(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.controller.reset().await?))
}
