use axum::{Json, response::IntoResponse};
use serde_json::json;

use unspoken_types::resources::directory;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Crisis helplines, counseling programs and community stories.
pub async fn resources() -> impl IntoResponse {
    Json(directory())
}
