use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to send HTTP request: {0}")]
    Http(String),

    #[error("chat API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to extract job id: {0}")]
    JobIdExtraction(String),

    #[error("unexpected chat API response: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(error: reqwest::Error) -> Self {
        ChatError::Http(error.to_string())
    }
}

impl ChatError {
    /// The single display fragment shown to the consumer when this error
    /// terminates a question.
    ///
    /// Status errors surface the raw response body verbatim (the backend
    /// puts its user-facing notice there); everything else surfaces its
    /// Display text as a diagnostic.
    #[must_use]
    pub fn terminal_fragment(&self) -> String {
        match self {
            ChatError::Status { body, .. } if !body.trim().is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}
