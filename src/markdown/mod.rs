//! Markdown-friendly restyling of the streamed answer

pub mod reformat;
pub mod rules;

// Re-export the main types for convenience
pub use reformat::Reformatter;

/// Transient status line the backend repeats while a web search is running.
/// Shown once, suppressed afterwards.
pub const SEARCH_STATUS_MARKER: &str = "Calling search engine 🔎";

/// Marker the backend emits when a video generation job succeeded; the line
/// also carries a Markdown link to the rendered file.
pub const VIDEO_SUCCESS_MARKER: &str = "Video generated successfully, [click here](https:";

/// Fallback shown when the stream finished without producing any content.
pub const BUSY_NOTICE: &str = "The AI service is busy right now, please try again later 😢";
