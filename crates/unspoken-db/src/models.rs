//! Row mapping between SQLite and the shared wire types, plus the outcome
//! enums returned by the multi-step write operations.

use rusqlite::Row;
use rusqlite::types::Type;

use unspoken_types::models::{
    CircleMembership, CircleMessage, EchoConversation, EchoMessage, JournalEntry, Mood,
    PeerCircle, User,
};

/// Input for a journal insert. Validation happens before this is built.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub user_id: i64,
    pub mood: Mood,
    pub content: String,
    pub tags: Option<Vec<String>>,
}

/// Result of an attempted circle join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(CircleMembership),
    CircleNotFound,
    UserNotFound,
    AlreadyMember,
    CircleFull { max_members: i64 },
}

/// Result of an attempted circle message send.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent(CircleMessage),
    NotMember,
}

pub(crate) const USER_COLUMNS: &str = "id, username, created_at, last_active";
pub(crate) const JOURNAL_COLUMNS: &str = "id, user_id, mood, content, tags, created_at";
pub(crate) const CONVERSATION_COLUMNS: &str = "id, user_id, messages, created_at, updated_at";
pub(crate) const MEMBERSHIP_COLUMNS: &str = "id, circle_id, user_id, joined_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
        last_active: row.get(3)?,
    })
}

pub(crate) fn journal_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    let mood: String = row.get(2)?;
    let mood = mood
        .parse::<Mood>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let tags: Option<String> = row.get(4)?;
    let tags = tags
        .map(|raw| serde_json::from_str::<Vec<String>>(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(JournalEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        mood,
        content: row.get(3)?,
        tags,
        created_at: row.get(5)?,
    })
}

pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<EchoConversation> {
    let raw: String = row.get(2)?;
    let messages = serde_json::from_str::<Vec<EchoMessage>>(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(EchoConversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        messages,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Expects `id, name, topic, description, max_members, created_at, current_members`.
pub(crate) fn circle_from_row(row: &Row<'_>) -> rusqlite::Result<PeerCircle> {
    Ok(PeerCircle {
        id: row.get(0)?,
        name: row.get(1)?,
        topic: row.get(2)?,
        description: row.get(3)?,
        max_members: row.get(4)?,
        created_at: row.get(5)?,
        current_members: row.get(6)?,
    })
}

pub(crate) fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<CircleMembership> {
    Ok(CircleMembership {
        id: row.get(0)?,
        circle_id: row.get(1)?,
        user_id: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

/// Expects `id, circle_id, user_id, username, content, created_at`.
pub(crate) fn circle_message_from_row(row: &Row<'_>) -> rusqlite::Result<CircleMessage> {
    Ok(CircleMessage {
        id: row.get(0)?,
        circle_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}
