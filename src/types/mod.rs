//! Wire types: the chat HTTP API and the Gemini REST payloads.

pub mod chat;
pub mod gemini;
pub mod gemini_models;
