pub mod generation;

pub use generation::{GenerationClient, GenerationConfig, GenerationOutcome, TextGenerator};
