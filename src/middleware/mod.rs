pub mod chat_request;
pub mod credential;

pub use chat_request::ChatRequest;
pub use credential::caller_credential;
