use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use common::utils::validation::{validate_filename, validate_username};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    pub username: String,
    pub password: String,
    #[form_data(limit = "25MiB")]
    pub file: FieldData<Bytes>,
}

pub async fn upload_document(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&input.username)?;
    let filename = input
        .file
        .metadata
        .file_name
        .clone()
        .ok_or_else(|| ApiError::ValidationError("file part must carry a filename".to_string()))?;
    validate_filename(&filename)?;

    state
        .gate
        .authorize_tenant(&input.username, &input.password)
        .await?;

    info!(
        username = %input.username,
        %filename,
        bytes = input.file.contents.len(),
        "Received document upload"
    );

    let report = state
        .ingestion
        .ingest(&input.username, &filename, input.file.contents)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "uploaded",
            "file": report.filename,
            "chunks": report.chunk_count
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsRequest {
    pub username: String,
    pub password: String,
}

pub async fn list_documents(
    State(state): State<ApiState>,
    Json(request): Json<ListDocumentsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&request.username)?;
    state
        .gate
        .authorize_tenant(&request.username, &request.password)
        .await?;

    let documents = state.workspace.list_documents(&request.username).await?;

    Ok((StatusCode::OK, Json(json!({ "documents": documents }))))
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentRequest {
    pub username: String,
    pub password: String,
    pub filename: String,
}

pub async fn delete_document(
    State(state): State<ApiState>,
    Json(request): Json<DeleteDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&request.username)?;
    validate_filename(&request.filename)?;
    state
        .gate
        .authorize_tenant(&request.username, &request.password)
        .await?;

    state
        .workspace
        .delete_document(&request.username, &request.filename)
        .await?;

    info!(username = %request.username, filename = %request.filename, "Deleted document");

    Ok((
        StatusCode::OK,
        Json(json!({ "status": "deleted", "file": request.filename })),
    ))
}
