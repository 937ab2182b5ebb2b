//! Question orchestration.
//!
//! Drives the full exchange for one question: submit, deliver the answer
//! fragments as they arrive, and run the post-completion wallet check. All
//! terminal outcomes (inline service messages, status-error bodies,
//! extraction diagnostics, the interruption and busy notices) reach the
//! consumer as display fragments through the same callback.

use tracing::error;

use crate::api::client::{AnswerStream, ChatClient};
use crate::core::models::Turn;
use crate::errors::ChatError;

/// Submits `question` and feeds every display fragment to `on_fragment`
/// until the answer is exhausted.
///
/// Submit-phase failures are delivered as their terminal fragment before
/// the error is returned, so the consumer always sees something and the
/// caller can still log the underlying failure. Stream-phase failures are
/// already folded into fragments by the answer stream and do not surface
/// here.
///
/// # Errors
///
/// Returns the underlying `ChatError` for submit-phase failures (after
/// delivering its terminal fragment).
pub async fn run_question<F>(
    client: &ChatClient,
    question: &str,
    context: &[Turn],
    mut on_fragment: F,
) -> Result<(), ChatError>
where
    F: FnMut(&str),
{
    let stream = match client.submit(question, context).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("submit failed: {e}");
            on_fragment(&e.terminal_fragment());
            return Err(e);
        }
    };

    match stream {
        AnswerStream::Inline(message) => {
            on_fragment(&message);
            Ok(())
        }
        AnswerStream::Active(mut active) => {
            while let Some(fragment) = active.next_fragment().await {
                on_fragment(&fragment);
            }
            if active.completed_ok() {
                client.check_wallet().await;
            }
            Ok(())
        }
    }
}
