use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Timestamps travel as RFC 3339 UTC strings (`2024-12-15T08:30:00.000Z`).
/// Lexical order of these strings is chronological order.
pub type Timestamp = String;

/// The fixed set of moods a journal entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Calm,
    Okay,
    Stressed,
    Anxious,
    Sad,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Great,
        Mood::Good,
        Mood::Calm,
        Mood::Okay,
        Mood::Stressed,
        Mood::Anxious,
        Mood::Sad,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Calm => "calm",
            Mood::Okay => "okay",
            Mood::Stressed => "stressed",
            Mood::Anxious => "anxious",
            Mood::Sad => "sad",
        }
    }

    /// Comma separated list used in validation messages.
    pub fn allowed_list() -> String {
        Mood::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMood(pub String);

impl fmt::Display for UnknownMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mood '{}'", self.0)
    }
}

impl std::error::Error for UnknownMood {}

impl FromStr for Mood {
    type Err = UnknownMood;

    /// Exact, case-sensitive match. `"Great"` is not a mood.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: Timestamp,
    pub last_active: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub user_id: i64,
    pub mood: Mood,
    pub content: String,
    pub tags: Option<Vec<String>>,
    pub created_at: Timestamp,
}

/// One turn of an Echo conversation as the client recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoMessage {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoConversation {
    pub id: i64,
    pub user_id: i64,
    pub messages: Vec<EchoMessage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A peer circle as listed to clients, with its live member count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerCircle {
    pub id: i64,
    pub name: String,
    pub topic: String,
    pub description: String,
    pub max_members: i64,
    pub created_at: Timestamp,
    pub current_members: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleMembership {
    pub id: i64,
    pub circle_id: i64,
    pub user_id: i64,
    pub joined_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleMessage {
    pub id: i64,
    pub circle_id: i64,
    pub user_id: i64,
    /// Present on listings, absent on the row returned by a send.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    pub content: String,
    pub created_at: Timestamp,
}
