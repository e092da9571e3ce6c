//! Database module: message model, schema and the SQLite-backed store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: `MessageStore`, the only component that touches SQL

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Message, MessageRole};
pub use schema::SQLITE_INIT;
pub use sqlite::{MessageStore, SqlitePool};
