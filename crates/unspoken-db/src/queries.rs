use crate::models::{
    CONVERSATION_COLUMNS, JOURNAL_COLUMNS, JoinOutcome, MEMBERSHIP_COLUMNS, NewJournalEntry,
    SendOutcome, USER_COLUMNS, circle_from_row, circle_message_from_row, conversation_from_row,
    journal_from_row, membership_from_row, user_from_row,
};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, TransactionBehavior, params};
use unspoken_types::models::{
    CircleMessage, EchoConversation, EchoMessage, JournalEntry, Mood, PeerCircle, User,
};

impl Database {
    // -- Users --

    /// Inserts a user unless the name is taken. `None` means duplicate.
    pub fn create_user(&self, username: &str) -> Result<Option<User>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let taken: Option<i64> = tx
                .query_row("SELECT id FROM users WHERE username = ?1", [username], |r| r.get(0))
                .optional()?;
            if taken.is_some() {
                return Ok(None);
            }

            let now = now_timestamp();
            tx.execute(
                "INSERT INTO users (username, created_at, last_active) VALUES (?1, ?2, ?2)",
                params![username, now],
            )?;
            let user = query_user_by_id(&tx, tx.last_insert_rowid())?;
            tx.commit()?;
            Ok(user)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| user_exists(conn, id))
    }

    // -- Journal --

    pub fn create_journal_entry(&self, entry: &NewJournalEntry) -> Result<JournalEntry> {
        let tags = entry.tags.as_ref().map(serde_json::to_string).transpose()?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO journal_entries (user_id, mood, content, tags, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![entry.user_id, entry.mood.as_str(), entry.content, tags, now_timestamp()],
            )?;
            let id = conn.last_insert_rowid();
            query_journal_entry(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("Journal entry {} vanished after insert", id))
        })
    }

    /// Newest first, optionally narrowed to one mood.
    pub fn list_journal_entries(
        &self,
        user_id: i64,
        mood: Option<Mood>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOURNAL_COLUMNS} FROM journal_entries
                 WHERE user_id = ?1 AND (?2 IS NULL OR mood = ?2)
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![user_id, mood.map(Mood::as_str), limit, offset],
                    journal_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_journal_entry(&self, id: i64) -> Result<Option<JournalEntry>> {
        self.with_conn(|conn| query_journal_entry(conn, id))
    }

    /// Removes and returns the entry, or `None` if it does not exist.
    pub fn delete_journal_entry(&self, id: i64) -> Result<Option<JournalEntry>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(entry) = query_journal_entry(&tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM journal_entries WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(Some(entry))
        })
    }

    // -- Echo conversations --

    /// Always inserts a new row; earlier saves are never touched.
    pub fn save_conversation(
        &self,
        user_id: i64,
        messages: &[EchoMessage],
    ) -> Result<EchoConversation> {
        let raw = serde_json::to_string(messages)?;
        self.with_conn_mut(|conn| {
            let now = now_timestamp();
            conn.execute(
                "INSERT INTO echo_conversations (user_id, messages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![user_id, raw, now],
            )?;
            let id = conn.last_insert_rowid();
            let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM echo_conversations WHERE id = ?1");
            let conversation = conn.query_row(&sql, [id], conversation_from_row)?;
            Ok(conversation)
        })
    }

    /// Most recently updated first.
    pub fn list_conversations(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EchoConversation>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM echo_conversations
                 WHERE user_id = ?1
                 ORDER BY updated_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], conversation_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Circles --

    /// Newest circles first, each with its live member count.
    pub fn list_circles(
        &self,
        topic: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PeerCircle>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, c.topic, c.description, c.max_members, c.created_at,
                        COALESCE(m.count, 0)
                 FROM peer_circles c
                 LEFT JOIN (
                     SELECT circle_id, COUNT(*) AS count
                     FROM circle_memberships
                     GROUP BY circle_id
                 ) m ON m.circle_id = c.id
                 WHERE ?1 IS NULL OR c.topic LIKE '%' || ?1 || '%'
                 ORDER BY c.created_at DESC, c.id DESC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![topic, limit, offset], circle_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_circle(&self, id: i64) -> Result<Option<PeerCircle>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT c.id, c.name, c.topic, c.description, c.max_members, c.created_at,
                            (SELECT COUNT(*) FROM circle_memberships WHERE circle_id = c.id)
                     FROM peer_circles c WHERE c.id = ?1",
                    [id],
                    circle_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn count_circles(&self) -> Result<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM peer_circles", [], |r| r.get(0))?)
        })
    }

    // -- Memberships --

    /// Joins `user_id` to `circle_id` if there is room.
    ///
    /// Every check and the insert run in one IMMEDIATE transaction on the
    /// writer connection, so two joins racing for the last seat cannot both
    /// succeed.
    pub fn join_circle(&self, circle_id: i64, user_id: i64) -> Result<JoinOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let max_members: Option<i64> = tx
                .query_row(
                    "SELECT max_members FROM peer_circles WHERE id = ?1",
                    [circle_id],
                    |r| r.get(0),
                )
                .optional()?;
            let Some(max_members) = max_members else {
                return Ok(JoinOutcome::CircleNotFound);
            };

            if !user_exists(&tx, user_id)? {
                return Ok(JoinOutcome::UserNotFound);
            }

            if membership_exists(&tx, circle_id, user_id)? {
                return Ok(JoinOutcome::AlreadyMember);
            }

            let current: i64 = tx.query_row(
                "SELECT COUNT(*) FROM circle_memberships WHERE circle_id = ?1",
                [circle_id],
                |r| r.get(0),
            )?;
            if current >= max_members {
                return Ok(JoinOutcome::CircleFull { max_members });
            }

            tx.execute(
                "INSERT INTO circle_memberships (circle_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                params![circle_id, user_id, now_timestamp()],
            )?;
            let id = tx.last_insert_rowid();
            let sql = format!("SELECT {MEMBERSHIP_COLUMNS} FROM circle_memberships WHERE id = ?1");
            let membership = tx.query_row(&sql, [id], membership_from_row)?;
            tx.commit()?;

            Ok(JoinOutcome::Joined(membership))
        })
    }

    pub fn is_member(&self, circle_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| membership_exists(conn, circle_id, user_id))
    }

    // -- Circle messages --

    /// Oldest first.
    pub fn list_circle_messages(
        &self,
        circle_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CircleMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.circle_id, m.user_id, u.username, m.content, m.created_at
                 FROM circle_messages m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.circle_id = ?1
                 ORDER BY m.created_at ASC, m.id ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![circle_id, limit, offset], circle_message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Appends a message if the sender currently holds a membership.
    pub fn send_circle_message(
        &self,
        circle_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<SendOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !membership_exists(&tx, circle_id, user_id)? {
                return Ok(SendOutcome::NotMember);
            }

            let now = now_timestamp();
            tx.execute(
                "INSERT INTO circle_messages (circle_id, user_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![circle_id, user_id, content, now],
            )?;
            let message = CircleMessage {
                id: tx.last_insert_rowid(),
                circle_id,
                user_id,
                username: None,
                content: content.to_string(),
                created_at: now,
            };
            tx.commit()?;
            Ok(SendOutcome::Sent(message))
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = conn.query_row(&sql, [id], user_from_row).optional()?;
    Ok(row)
}

fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn query_journal_entry(conn: &Connection, id: i64) -> Result<Option<JournalEntry>> {
    let sql = format!("SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = ?1");
    let row = conn.query_row(&sql, [id], journal_from_row).optional()?;
    Ok(row)
}

fn membership_exists(conn: &Connection, circle_id: i64, user_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM circle_memberships WHERE circle_id = ?1 AND user_id = ?2",
            [circle_id, user_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
