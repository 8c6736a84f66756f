use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use unspoken_types::api::{CreateUserRequest, CreateUserResponse, ListQuery};

use crate::error::{ApiError, ApiResult};
use crate::session::issue_token;
use crate::state::{AppState, run_db};
use crate::validate::{JsonBody, query_id, required_text};

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let username = required_text(
        req.username.as_ref(),
        "username",
        "MISSING_USERNAME",
        "MISSING_USERNAME",
    )?;

    let user = run_db(&state, move |db| db.create_user(&username))
        .await?
        .ok_or_else(|| ApiError::bad_request("DUPLICATE_USERNAME", "Username already exists"))?;

    let token = issue_token(&state.sessions, &user)?;

    info!("Created user {} ({})", user.id, user.username);
    Ok((StatusCode::CREATED, Json(CreateUserResponse { user, token })))
}

pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = query_id(query.id.as_deref(), "id", "MISSING_ID", "INVALID_ID")?;

    let user = run_db(&state, move |db| db.get_user(id))
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    Ok(Json(user))
}
