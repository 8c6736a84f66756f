use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{JournalEntry, User};

// -- Session --

/// Session token claims. `sub` is the user id the bearer may act as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Errors --

/// Body of every non-2xx response outside the Echo proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
}

// -- Users --
//
// Request bodies keep loosely typed fields: clients send ids as numbers or
// numeric strings, and each field gets its own error code when it is wrong.

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

// -- Journal --

#[derive(Debug, Default, Deserialize)]
pub struct CreateJournalEntryRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub mood: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub tags: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteJournalEntryResponse {
    pub message: String,
    pub deleted_entry: JournalEntry,
}

// -- Circles --

#[derive(Debug, Default, Deserialize)]
pub struct JoinCircleRequest {
    #[serde(default)]
    pub circle_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendCircleMessageRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

// -- Echo --

/// A chat turn sent to the Echo companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EchoRequest {
    #[serde(default)]
    pub messages: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoReply {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveConversationRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub messages: Option<Value>,
}

// -- Pagination / filters --

/// Raw query parameters. Values stay strings so that unparsable numbers
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub mood: Option<String>,
    pub topic: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}
