/// chatmd - a client for a remote chat-completion API that restyles the
/// streamed answer into Markdown-friendly display fragments.
///
/// Asking a question is a two-step exchange with the backend:
/// 1. A submit call that registers the question (plus optional prior-turn
///    context) and returns a job reference
/// 2. A long-lived poll call against that job reference whose body streams
///    the answer as raw text lines
///
/// The streamed lines are passed through a small stateful reformatter that
/// emits display-ready fragments: trailing-space line breaks, blank-line
/// separators around blockquotes, horizontal rules and tables, extra spacing
/// after list items, and `<video>` embeds for generated media links.
///
/// # Example
///
/// ```no_run
/// use chatmd::api::client::ChatClient;
/// use chatmd::core::config::AppConfig;
/// use chatmd::session::run_question;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     chatmd::setup_logging();
///
///     let config = AppConfig {
///         base_url: "https://chat.example.com/chatapi".to_string(),
///         auth_token: "dummy_token".to_string(),
///         topic_id: 2222222,
///         source_token: None,
///         accept_language: "en-US".to_string(),
///         model: None,
///         markdown_hint: false,
///     };
///
///     let client = ChatClient::new(config)?;
///     run_question(&client, "1+1", &[], |fragment| {
///         print!("{fragment}");
///     })
///     .await?;
///
///     Ok(())
/// }
/// ```
// Module declarations
pub mod api;
pub mod core;
pub mod errors;
pub mod markdown;
pub mod session;

/// Configure structured logging for terminal use.
///
/// Installs a tracing-subscriber fmt layer. Call once at process startup;
/// library code only emits `tracing` events and never installs subscribers.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
