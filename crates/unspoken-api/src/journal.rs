use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use tracing::{info, warn};

use unspoken_db::NewJournalEntry;
use unspoken_types::Mood;
use unspoken_types::api::{CreateJournalEntryRequest, DeleteJournalEntryResponse, ListQuery};

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, require_if_configured};
use crate::state::{AppState, run_db};
use crate::validate::{JsonBody, Page, body_id, is_missing, query_id, required_text};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

fn parse_mood(raw: &str) -> ApiResult<Mood> {
    raw.parse::<Mood>().map_err(|_| {
        ApiError::bad_request(
            "INVALID_MOOD",
            format!("mood must be one of: {}", Mood::allowed_list()),
        )
    })
}

fn parse_tags(tags: Option<Value>) -> ApiResult<Option<Vec<String>>> {
    match tags {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|tag| match tag {
                Value::String(s) => Ok(s),
                _ => Err(ApiError::bad_request("INVALID_TAG_TYPE", "all tags must be strings")),
            })
            .collect::<ApiResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(ApiError::bad_request(
            "INVALID_TAGS",
            "tags must be an array of strings",
        )),
    }
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    JsonBody(req): JsonBody<CreateJournalEntryRequest>,
) -> ApiResult<impl IntoResponse> {
    // Presence of every field is reported before any field's format.
    for (value, field, code) in [
        (&req.user_id, "user_id", "MISSING_USER_ID"),
        (&req.mood, "mood", "MISSING_MOOD"),
        (&req.content, "content", "MISSING_CONTENT"),
    ] {
        if is_missing(value.as_ref()) {
            return Err(ApiError::bad_request(code, format!("{} is required", field)));
        }
    }

    let user_id = body_id(req.user_id.as_ref(), "user_id", "MISSING_USER_ID", "INVALID_USER_ID")?;
    let mood = parse_mood(req.mood.as_ref().and_then(Value::as_str).unwrap_or_default())?;
    let content = required_text(req.content.as_ref(), "content", "MISSING_CONTENT", "INVALID_CONTENT")?;
    session.authorize(&state.sessions, user_id)?;

    if !run_db(&state, move |db| db.user_exists(user_id)).await? {
        return Err(ApiError::bad_request("USER_NOT_FOUND", "User not found"));
    }
    let tags = parse_tags(req.tags)?;

    let entry = NewJournalEntry {
        user_id,
        mood,
        content,
        tags,
    };
    let created = run_db(&state, move |db| db.create_journal_entry(&entry)).await?;

    info!("Journal entry {} created for user {}", created.id, created.user_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let user_id = query_id(query.user_id.as_deref(), "user_id", "MISSING_USER_ID", "INVALID_USER_ID")?;
    let mood = match query.mood.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(parse_mood(raw)?),
    };
    let page = Page::from_query(query.limit.as_deref(), query.offset.as_deref(), DEFAULT_LIMIT, MAX_LIMIT);
    session.authorize(&state.sessions, user_id)?;

    let entries = run_db(&state, move |db| {
        db.list_journal_entries(user_id, mood, page.limit, page.offset)
    })
    .await?;
    Ok(Json(entries))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let id = query_id(query.id.as_deref(), "id", "MISSING_ID", "INVALID_ID")?;

    match session.claims() {
        Some(claims) => {
            let owner = claims.sub;
            let entry = run_db(&state, move |db| db.get_journal_entry(id))
                .await?
                .ok_or_else(|| ApiError::not_found("ENTRY_NOT_FOUND", "Journal entry not found"))?;
            if entry.user_id != owner {
                return Err(ApiError::forbidden(
                    "NOT_ENTRY_OWNER",
                    "Journal entry belongs to another user",
                ));
            }
        }
        None => {
            require_if_configured(&state.sessions)?;
            warn!("Deleting journal entry {} without a session", id);
        }
    }

    let deleted = run_db(&state, move |db| db.delete_journal_entry(id))
        .await?
        .ok_or_else(|| ApiError::not_found("ENTRY_NOT_FOUND", "Journal entry not found"))?;

    Ok(Json(DeleteJournalEntryResponse {
        message: "Journal entry deleted successfully".to_string(),
        deleted_entry: deleted,
    }))
}
