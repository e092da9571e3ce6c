use crate::db::models::{Message, MessageRole};
use crate::db::schema::SQLITE_INIT;
use crate::error::ChatError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Append-only message log backed by a single SQLite table.
///
/// Cloning is cheap: clones share the same underlying connection.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build a store whose single long-lived connection is opened on first use.
    ///
    /// The pool is capped at one connection with no idle or lifetime expiry,
    /// so `sqlite::memory:` databases survive for the life of the store.
    pub fn connect_lazy(database_url: &str) -> Result<Self, ChatError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(connect_opts);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL. Idempotent.
    pub async fn init_schema(&self) -> Result<(), ChatError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert one message and return its assigned id.
    pub async fn append(
        &self,
        role: MessageRole,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, ChatError> {
        let result = sqlx::query("INSERT INTO messages (role, content, timestamp) VALUES (?, ?, ?)")
            .bind(role.as_str())
            .bind(content)
            .bind(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true))
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Every message, oldest first.
    pub async fn list_all(&self) -> Result<Vec<Message>, ChatError> {
        let rows = sqlx::query(
            "SELECT message_id, role, content, timestamp FROM messages ORDER BY message_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    /// The newest `limit` messages, returned oldest first.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Message>, ChatError> {
        let rows = sqlx::query(
            "SELECT message_id, role, content, timestamp FROM messages ORDER BY message_id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        let mut messages = rows
            .into_iter()
            .map(Self::row_to_model)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Delete every message. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64, ChatError> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Release the connection. Calling this more than once is a no-op.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn row_to_model(row: SqliteRow) -> Result<Message, ChatError> {
        let id: i64 = row.try_get("message_id")?;
        let role_str: String = row.try_get("role")?;
        let content: String = row.try_get("content")?;
        let timestamp_str: String = row.try_get("timestamp")?;

        let role = MessageRole::from_str(&role_str).map_err(|e| sqlx::Error::Decode(e.into()))?;
        let timestamp = parse_timestamp(&timestamp_str)?;

        Ok(Message {
            id,
            role,
            content,
            timestamp,
        })
    }
}

/// RFC3339 first; naive ISO-8601 rows (no offset) are read as UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ChatError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(naive.and_utc())
}
