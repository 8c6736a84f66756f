use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const CURRENT_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL,
                last_active TEXT NOT NULL
            );

            CREATE TABLE journal_entries (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                mood        TEXT NOT NULL
                    CHECK (mood IN ('great', 'good', 'calm', 'okay', 'stressed', 'anxious', 'sad')),
                content     TEXT NOT NULL,
                tags        TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_journal_user
                ON journal_entries(user_id, created_at);

            CREATE TABLE echo_conversations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                messages    TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_echo_user
                ON echo_conversations(user_id, updated_at);

            CREATE TABLE peer_circles (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                topic       TEXT NOT NULL,
                description TEXT NOT NULL,
                max_members INTEGER NOT NULL DEFAULT 7,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE circle_memberships (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                circle_id   INTEGER NOT NULL REFERENCES peer_circles(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                joined_at   TEXT NOT NULL,
                UNIQUE(circle_id, user_id)
            );

            CREATE TABLE circle_messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                circle_id   INTEGER NOT NULL REFERENCES peer_circles(id),
                user_id     INTEGER NOT NULL REFERENCES users(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_circle_messages_circle
                ON circle_messages(circle_id, created_at);

            CREATE TABLE voice_recordings (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          INTEGER NOT NULL REFERENCES users(id),
                duration         INTEGER NOT NULL,
                emotion_analysis TEXT,
                created_at       TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", CURRENT_VERSION);
    Ok(())
}
