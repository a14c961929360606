use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::{
    storage::{collection::ChunkCollection, workspace::collection_name},
    utils::validation::validate_username,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub secret: String,
}

pub async fn create_user(
    State(state): State<ApiState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize_admin(&request.secret)?;
    validate_username(&request.username)?;
    if request.password.is_empty() {
        return Err(ApiError::ValidationError(
            "password must not be empty".to_string(),
        ));
    }

    state
        .credentials
        .add_user(&request.username, &request.password)
        .await?;

    info!(username = %request.username, "Created user");

    Ok((
        StatusCode::OK,
        Json(json!({ "status": "created", "user": request.username })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub username: String,
    pub secret: String,
}

/// Deleting a user cascades into their workspace and collection. Both
/// removals are best-effort: a failure is logged and the deletion still
/// succeeds.
pub async fn delete_user(
    State(state): State<ApiState>,
    Json(request): Json<DeleteUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize_admin(&request.secret)?;
    validate_username(&request.username)?;

    state.credentials.delete_user(&request.username).await?;

    if let Err(err) = state.workspace.destroy(&request.username).await {
        warn!(
            username = %request.username,
            error = %err,
            "failed to remove tenant workspace during user deletion"
        );
    }

    let collection = ChunkCollection::open(
        Arc::clone(&state.db),
        Arc::clone(&state.embedder),
        collection_name(&request.username),
    );
    if let Err(err) = collection.destroy().await {
        warn!(
            username = %request.username,
            error = %err,
            "failed to remove tenant collection during user deletion"
        );
    }

    info!(username = %request.username, "Deleted user");

    Ok((
        StatusCode::OK,
        Json(json!({ "status": "deleted", "user": request.username })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersRequest {
    pub secret: String,
}

pub async fn list_users(
    State(state): State<ApiState>,
    Json(request): Json<ListUsersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.gate.authorize_admin(&request.secret)?;

    let users = state.credentials.list_users().await?;

    Ok((StatusCode::OK, Json(json!({ "users": users }))))
}
