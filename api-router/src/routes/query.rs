use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use common::utils::validation::validate_username;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub username: String,
    pub password: String,
    pub message: String,
}

pub async fn query(
    State(state): State<ApiState>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&request.username)?;
    if request.message.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "message must not be empty".to_string(),
        ));
    }

    state
        .gate
        .authorize_tenant(&request.username, &request.password)
        .await?;

    info!(
        username = %request.username,
        message_chars = request.message.chars().count(),
        "Received query"
    );

    let answer = state
        .answers
        .answer(&request.username, &request.message)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "response": answer }))))
}
