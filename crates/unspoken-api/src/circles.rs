use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use unspoken_db::{JoinOutcome, SendOutcome};
use unspoken_types::api::{JoinCircleRequest, ListQuery, SendCircleMessageRequest};

use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::state::{AppState, run_db};
use crate::validate::{JsonBody, Page, body_id, is_missing, path_id, required_text};

const CIRCLES_DEFAULT_LIMIT: i64 = 20;
const CIRCLES_MAX_LIMIT: i64 = 100;
const MESSAGES_DEFAULT_LIMIT: i64 = 50;
const MESSAGES_MAX_LIMIT: i64 = 200;

pub async fn list_circles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(
        query.limit.as_deref(),
        query.offset.as_deref(),
        CIRCLES_DEFAULT_LIMIT,
        CIRCLES_MAX_LIMIT,
    );
    let topic = query.topic.filter(|t| !t.is_empty());

    let circles = run_db(&state, move |db| {
        db.list_circles(topic.as_deref(), page.limit, page.offset)
    })
    .await?;
    Ok(Json(circles))
}

pub async fn join_circle(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    JsonBody(req): JsonBody<JoinCircleRequest>,
) -> ApiResult<impl IntoResponse> {
    if is_missing(req.circle_id.as_ref()) {
        return Err(ApiError::bad_request("MISSING_CIRCLE_ID", "circle_id is required"));
    }
    if is_missing(req.user_id.as_ref()) {
        return Err(ApiError::bad_request("MISSING_USER_ID", "user_id is required"));
    }
    let circle_id = body_id(
        req.circle_id.as_ref(),
        "circle_id",
        "MISSING_CIRCLE_ID",
        "INVALID_CIRCLE_ID",
    )?;
    let user_id = body_id(req.user_id.as_ref(), "user_id", "MISSING_USER_ID", "INVALID_USER_ID")?;
    session.authorize(&state.sessions, user_id)?;

    let outcome = run_db(&state, move |db| db.join_circle(circle_id, user_id)).await?;
    match outcome {
        JoinOutcome::Joined(membership) => {
            info!("User {} joined circle {}", user_id, circle_id);
            Ok((StatusCode::CREATED, Json(membership)))
        }
        JoinOutcome::CircleNotFound => Err(ApiError::not_found("CIRCLE_NOT_FOUND", "Circle not found")),
        JoinOutcome::UserNotFound => Err(ApiError::bad_request("USER_NOT_FOUND", "User not found")),
        JoinOutcome::AlreadyMember => Err(ApiError::bad_request(
            "ALREADY_MEMBER",
            "User is already a member of this circle",
        )),
        JoinOutcome::CircleFull { max_members } => {
            debug!("Circle {} is at capacity ({})", circle_id, max_members);
            Err(ApiError::bad_request("CIRCLE_FULL", "Circle is full"))
        }
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let circle_id = path_id(&id, "INVALID_CIRCLE_ID", "circle")?;
    let page = Page::from_query(
        query.limit.as_deref(),
        query.offset.as_deref(),
        MESSAGES_DEFAULT_LIMIT,
        MESSAGES_MAX_LIMIT,
    );

    let messages = run_db(&state, move |db| {
        db.list_circle_messages(circle_id, page.limit, page.offset)
    })
    .await?;
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SendCircleMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let circle_id = path_id(&id, "INVALID_CIRCLE_ID", "circle")?;
    let user_id = body_id(req.user_id.as_ref(), "user_id", "INVALID_USER_ID", "INVALID_USER_ID")?;
    let content = required_text(req.content.as_ref(), "content", "INVALID_CONTENT", "INVALID_CONTENT")?;
    session.authorize(&state.sessions, user_id)?;

    let outcome = run_db(&state, move |db| db.send_circle_message(circle_id, user_id, &content)).await?;
    match outcome {
        SendOutcome::Sent(message) => Ok((StatusCode::CREATED, Json(message))),
        SendOutcome::NotMember => Err(ApiError::forbidden(
            "NOT_CIRCLE_MEMBER",
            "User is not a member of this circle",
        )),
    }
}
