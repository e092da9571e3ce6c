pub mod gemini_api;

pub use gemini_api::GeminiApi;
