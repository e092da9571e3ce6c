pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod shutdown;
pub mod types;

pub use error::ChatError;
pub use db::{Message, MessageRole, MessageStore};
pub use service::generation::{GenerationClient, GenerationOutcome, TextGenerator};
