//! HTTP client for the chat backend

pub mod client;
pub mod lines;

// Re-export the main types for convenience
pub use client::{ActiveAnswerStream, AnswerStream, ChatClient};

/// Terminal fragment emitted when the poll stream dies mid-answer.
pub const INTERRUPTED_NOTICE: &str = "[connection interrupted, please retry]";
