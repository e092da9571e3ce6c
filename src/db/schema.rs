//! SQL DDL for initializing the message log.

/// SQLite schema with:
/// - `message_id` INTEGER PRIMARY KEY AUTOINCREMENT, the sole ordering key
/// - `role` restricted to `user` / `assistant`
/// - `timestamp` RFC3339 text, so lexical order matches chronological order
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    message_id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
    content TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
"#;
