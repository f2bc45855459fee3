//! Answer generation: prompt assembly over retrieved context

pub mod prompt;

pub use prompt::{truncate_chars, PromptBuilder};
