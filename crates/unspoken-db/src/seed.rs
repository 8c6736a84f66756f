use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use rusqlite::{Connection, params};
use tracing::info;

use crate::{Database, format_timestamp};

struct SeedCircle {
    name: &'static str,
    topic: &'static str,
    description: &'static str,
    age_days: i64,
}

const USERS: &[(&str, &str, &str)] = &[
    ("BraveWolf42", "2024-10-15T14:23:11.000Z", "2025-01-12T09:15:22.000Z"),
    ("CalmMountain88", "2024-11-02T08:45:33.000Z", "2025-01-13T18:42:15.000Z"),
    ("QuietOcean25", "2024-11-20T16:12:47.000Z", "2025-01-14T11:28:09.000Z"),
    ("SilentForest17", "2024-12-05T19:34:28.000Z", "2025-01-13T22:51:44.000Z"),
    ("StrongRiver33", "2024-12-18T10:07:55.000Z", "2025-01-14T07:33:18.000Z"),
];

const CIRCLES: &[SeedCircle] = &[
    SeedCircle {
        name: "New Fathers Support",
        topic: "Fatherhood",
        description: "A safe space for new dads to share experiences, challenges, and support each other through the journey of fatherhood.",
        age_days: 90,
    },
    SeedCircle {
        name: "Career Transitions",
        topic: "Career & Work",
        description: "Connect with others navigating career changes, job stress, and workplace mental health challenges.",
        age_days: 60,
    },
    SeedCircle {
        name: "Student Mental Health",
        topic: "Education & Students",
        description: "For students dealing with academic pressure, social anxiety, and the unique mental health challenges of student life.",
        age_days: 42,
    },
    SeedCircle {
        name: "Relationship Support",
        topic: "Relationships",
        description: "A judgment-free zone to discuss relationship challenges, communication issues, and building healthier connections.",
        age_days: 30,
    },
];

/// (circle index, username, joined_at)
const MEMBERSHIPS: &[(usize, &str, &str)] = &[
    (0, "BraveWolf42", "2024-01-16T00:00:00.000Z"),
    (0, "QuietOcean25", "2024-01-18T00:00:00.000Z"),
    (0, "StrongRiver33", "2024-01-22T00:00:00.000Z"),
    (1, "CalmMountain88", "2024-01-17T00:00:00.000Z"),
    (1, "SilentForest17", "2024-01-20T00:00:00.000Z"),
    (1, "StrongRiver33", "2024-01-25T00:00:00.000Z"),
    (2, "BraveWolf42", "2024-01-19T00:00:00.000Z"),
    (2, "CalmMountain88", "2024-01-21T00:00:00.000Z"),
    (2, "QuietOcean25", "2024-01-23T00:00:00.000Z"),
    (2, "SilentForest17", "2024-01-24T00:00:00.000Z"),
    (3, "QuietOcean25", "2024-01-26T00:00:00.000Z"),
    (3, "SilentForest17", "2024-01-27T00:00:00.000Z"),
];

/// (circle index, username, content, created_at)
const MESSAGES: &[(usize, &str, &str, &str)] = &[
    (
        0,
        "BraveWolf42",
        "Haven't slept more than 3 hours straight in weeks. My partner is exhausted too and I feel like I'm failing both of them. Is this normal? How did you guys get through this phase?",
        "2024-12-15T08:30:00.000Z",
    ),
    (
        0,
        "QuietOcean25",
        "You're not failing anyone. Those first months are brutal. What helped us was taking shifts. Even a little stretch of uninterrupted sleep makes a difference.",
        "2024-12-15T14:20:00.000Z",
    ),
    (
        0,
        "BraveWolf42",
        "Thanks for the encouragement. Tried the shift idea last night and got 4 solid hours. Feeling almost human again.",
        "2024-12-20T09:15:00.000Z",
    ),
    (
        1,
        "CalmMountain88",
        "Handed in my notice today. Terrified and relieved at the same time.",
        "2024-12-16T18:05:00.000Z",
    ),
    (
        1,
        "SilentForest17",
        "That takes guts. The uncertainty is the hardest part, but you made the call for your own wellbeing.",
        "2024-12-16T19:40:00.000Z",
    ),
    (
        2,
        "QuietOcean25",
        "Finals week and I can't focus on anything. Anyone have tricks for getting out of the panic spiral?",
        "2024-12-10T22:10:00.000Z",
    ),
    (
        2,
        "CalmMountain88",
        "Box breathing helps me. Four seconds in, hold four, out four, hold four. Sounds silly but it works.",
        "2024-12-10T22:45:00.000Z",
    ),
    (
        3,
        "SilentForest17",
        "Finally told my partner I've been struggling. It went better than I feared.",
        "2024-12-22T20:00:00.000Z",
    ),
];

/// (username, mood, content, tags, created_at)
const JOURNAL: &[(&str, &str, &str, &[&str], &str)] = &[
    (
        "CalmMountain88",
        "stressed",
        "Another late night at the office trying to meet this deadline. Feel like I'm constantly behind and can't catch a break.",
        &["work", "challenging"],
        "2024-12-29T22:30:00.000Z",
    ),
    (
        "BraveWolf42",
        "good",
        "Had a real conversation with my partner today about how I've been feeling. Felt scary to open up but she really listened.",
        &["relationships", "growth", "positive"],
        "2024-12-28T19:15:00.000Z",
    ),
    (
        "SilentForest17",
        "anxious",
        "Everyone expects me to have it all together. Sometimes I just want to admit I'm struggling but don't know how.",
        &["challenging", "family", "work"],
        "2024-12-27T14:20:00.000Z",
    ),
    (
        "QuietOcean25",
        "calm",
        "Went for a run this morning. Cleared my head in ways nothing else does.",
        &["exercise", "self-care"],
        "2024-12-26T07:45:00.000Z",
    ),
    (
        "StrongRiver33",
        "okay",
        "Not a great day, not a bad one. Just getting through it.",
        &[],
        "2024-12-25T21:00:00.000Z",
    ),
];

impl Database {
    /// Loads sample users, circles, memberships, messages and journal entries.
    /// Does nothing if any circle already exists. Returns whether it seeded.
    pub fn seed_if_empty(&self) -> Result<bool> {
        if self.count_circles()? > 0 {
            return Ok(false);
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            seed_all(&tx)?;
            tx.commit()?;
            Ok(())
        })?;

        info!(
            "Seeded {} users, {} circles, {} messages, {} journal entries",
            USERS.len(),
            CIRCLES.len(),
            MESSAGES.len(),
            JOURNAL.len()
        );
        Ok(true)
    }
}

fn seed_all(conn: &Connection) -> Result<()> {
    for (username, created_at, last_active) in USERS {
        conn.execute(
            "INSERT OR IGNORE INTO users (username, created_at, last_active) VALUES (?1, ?2, ?3)",
            params![username, created_at, last_active],
        )?;
    }

    let now = Utc::now();
    let mut circle_ids = Vec::with_capacity(CIRCLES.len());
    for circle in CIRCLES {
        conn.execute(
            "INSERT INTO peer_circles (name, topic, description, max_members, created_at)
             VALUES (?1, ?2, ?3, 7, ?4)",
            params![
                circle.name,
                circle.topic,
                circle.description,
                format_timestamp(now - Duration::days(circle.age_days)),
            ],
        )?;
        circle_ids.push(conn.last_insert_rowid());
    }

    for (circle, username, joined_at) in MEMBERSHIPS {
        conn.execute(
            "INSERT OR IGNORE INTO circle_memberships (circle_id, user_id, joined_at)
             VALUES (?1, ?2, ?3)",
            params![circle_ids[*circle], user_id(conn, username)?, joined_at],
        )?;
    }

    for (circle, username, content, created_at) in MESSAGES {
        conn.execute(
            "INSERT INTO circle_messages (circle_id, user_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![circle_ids[*circle], user_id(conn, username)?, content, created_at],
        )?;
    }

    for (username, mood, content, tags, created_at) in JOURNAL {
        let tags = (!tags.is_empty()).then(|| serde_json::to_string(tags)).transpose()?;
        conn.execute(
            "INSERT INTO journal_entries (user_id, mood, content, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id(conn, username)?, mood, content, tags, created_at],
        )?;
    }

    Ok(())
}

fn user_id(conn: &Connection, username: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM users WHERE username = ?1", [username], |r| r.get(0))
        .map_err(|e| anyhow!("Seed user {} missing: {}", username, e))
}
