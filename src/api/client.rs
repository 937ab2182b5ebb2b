//! Chat backend API client.
//!
//! Encapsulates the two-step question exchange (submit, then poll the
//! returned job reference for the streamed answer) plus the small side
//! calls: credential probe, model save, wallet check.

use futures::StreamExt;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::INTERRUPTED_NOTICE;
use super::lines::LineSplitter;
use crate::core::config::AppConfig;
use crate::core::models::{SubmitResponse, Turn};
use crate::errors::ChatError;
use crate::markdown::Reformatter;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);
/// Generation can take minutes; the poll request stays open for all of it.
const STREAM_TIMEOUT: Duration = Duration::from_secs(180);
const WALLET_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one configured chat backend topic.
pub struct ChatClient {
    http: reqwest::Client,
    config: AppConfig,
}

impl ChatClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn base_headers(&self) -> Result<reqwest::header::HeaderMap, ChatError> {
        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", self.config.auth_token)
            .parse()
            .map_err(|e| ChatError::Http(format!("invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        let content_type_value = "application/json"
            .parse()
            .map_err(|e| ChatError::Http(format!("invalid Content-Type header: {e}")))?;
        headers.insert("Content-Type", content_type_value);

        let language_value = self
            .config
            .accept_language
            .parse()
            .map_err(|e| ChatError::Http(format!("invalid Accept-Language header: {e}")))?;
        headers.insert("Accept-Language", language_value);

        Ok(headers)
    }

    fn submit_headers(&self) -> Result<reqwest::header::HeaderMap, ChatError> {
        let mut headers = self.base_headers()?;
        if let Some(source) = &self.config.source_token {
            let source_value = source
                .parse()
                .map_err(|e| ChatError::Http(format!("invalid source header: {e}")))?;
            headers.insert("xx-cf-source", source_value);
        }
        Ok(headers)
    }

    /// Submits a question and opens the answer stream for it.
    ///
    /// `context` carries the prior turns for a follow-up question; pass an
    /// empty slice for a fresh one. Returns [`AnswerStream::Inline`] when
    /// the backend answers the submit call directly with a terminal notice
    /// (quota errors and the like) instead of a job reference.
    ///
    /// # Errors
    ///
    /// `ChatError::Status` with the raw body for a non-2xx submit or poll
    /// response, `ChatError::JobIdExtraction` when the response carries no
    /// usable job identifier, `ChatError::Http`/`ChatError::Api` for
    /// transport and body-shape failures.
    pub async fn submit(&self, question: &str, context: &[Turn]) -> Result<AnswerStream, ChatError> {
        info!(
            "Submitting question with {} prior context turns",
            context.len()
        );

        let content = if self.config.markdown_hint {
            format!("{question}\n# please reply in markdown format")
        } else {
            question.to_string()
        };

        let body = json!({
            "topicId": self.config.topic_id,
            "messages": context,
            "content": content,
            "contentFiles": []
        });

        let response = self
            .http
            .post(format!("{}/chat/message", self.config.base_url))
            .headers(self.submit_headers()?)
            .timeout(SUBMIT_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Http(format!("submit request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                format!("failed to read error response body (status {status}): {e}")
            });
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let submit: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Api(format!("failed to parse submit response: {e}")))?;

        if !submit.message.is_empty() {
            info!("Submit call answered with an inline service message");
            return Ok(AnswerStream::Inline(submit.message));
        }

        let job_id = extract_job_id(&submit)?;
        debug!(%job_id, "Opening poll stream for job");

        let response = self
            .http
            .post(format!("{}/chat/message/{job_id}", self.config.base_url))
            .headers(self.base_headers()?)
            .timeout(STREAM_TIMEOUT)
            .send()
            .await
            .map_err(|e| ChatError::Http(format!("poll request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                format!("failed to read error response body (status {status}): {e}")
            });
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(AnswerStream::Active(ActiveAnswerStream::new(
            response.bytes_stream(),
        )))
    }

    /// Probes the configured topic id and bearer token without submitting
    /// anything. Valid credentials list at least one historic message.
    ///
    /// # Errors
    ///
    /// `ChatError::Api` with the server message (or a fixed diagnostic) when
    /// the credentials are rejected; the usual transport/status errors
    /// otherwise.
    pub async fn verify_auth(&self) -> Result<(), ChatError> {
        let body = json!({
            "id": self.config.topic_id,
            "page": 1,
            "pageSize": 20
        });

        let response = self
            .http
            .post(format!("{}/chat/topic/messages", self.config.base_url))
            .headers(self.base_headers()?)
            .timeout(SUBMIT_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Http(format!("auth probe request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                format!("failed to read error response body (status {status}): {e}")
            });
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Api(format!("failed to parse auth probe response: {e}")))?;

        let has_items = data
            .pointer("/result/items")
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty());
        if data.get("type").and_then(Value::as_str) == Some("success") && has_items {
            return Ok(());
        }

        let message = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("invalid topic id or token");
        Err(ChatError::Api(message.to_string()))
    }

    /// Saves the generation model for the configured topic.
    ///
    /// # Errors
    ///
    /// `ChatError::Api` with the server message when the save is refused;
    /// the usual transport/status errors otherwise.
    pub async fn set_model(&self, model_id: &str) -> Result<(), ChatError> {
        let params = json!({
            "chatPluginIds": [],
            "frequency_penalty": null,
            "max_tokens": 4096,
            "model": model_id,
            "presence_penalty": null,
            "requestMsgCount": 0,
            "speechVoice": "Alloy",
            "temperature": 0.8
        });

        // The save endpoint expects the params object pre-encoded.
        let body = json!({
            "id": self.config.topic_id,
            "isLock": true,
            "params": params.to_string(),
            "roleId": 0,
            "roleInfo": null,
            "systemMessage": "",
            "title": "1"
        });

        let response = self
            .http
            .post(format!("{}/chat/save", self.config.base_url))
            .headers(self.base_headers()?)
            .timeout(SUBMIT_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Http(format!("model save request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                format!("failed to read error response body (status {status}): {e}")
            });
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Api(format!("failed to parse model save response: {e}")))?;

        let saved = data.get("code").and_then(Value::as_i64) == Some(200)
            || data.get("type").and_then(Value::as_str) == Some("success");
        if saved {
            info!(%model_id, "Model saved for topic");
            return Ok(());
        }

        let message = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("failed to switch model");
        Err(ChatError::Api(message.to_string()))
    }

    /// Fetches the account wallet after an answer completes.
    ///
    /// Logging side effect only: the body is logged on success and every
    /// failure is caught and logged, never propagated.
    pub async fn check_wallet(&self) {
        let headers = match self.base_headers() {
            Ok(headers) => headers,
            Err(e) => {
                warn!("failed to build wallet request: {e}");
                return;
            }
        };

        let result = self
            .http
            .get(format!("{}/member/wallet", self.config.base_url))
            .headers(headers)
            .timeout(WALLET_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => match response.text().await {
                Ok(text) => info!("wallet status: {text}"),
                Err(e) => warn!("failed to read wallet response: {e}"),
            },
            Err(e) => warn!("failed to fetch wallet status: {e}"),
        }
    }
}

/// Picks the job reference out of a successful submit response.
///
/// `result` holds the ordered identifiers of the jobs created for the
/// submission; the last one addresses the most recently created job and is
/// the one the poll endpoint expects.
pub(crate) fn extract_job_id(response: &SubmitResponse) -> Result<String, ChatError> {
    let ids = response
        .result
        .as_ref()
        .and_then(Value::as_array)
        .ok_or_else(|| ChatError::JobIdExtraction("submit result is not an array".to_string()))?;

    let last = ids
        .last()
        .ok_or_else(|| ChatError::JobIdExtraction("submit result is empty".to_string()))?;

    match last {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        other => Err(ChatError::JobIdExtraction(format!(
            "unsupported job id shape: {other}"
        ))),
    }
}

/// Outcome of a submit call.
#[derive(Debug)]
pub enum AnswerStream {
    /// The backend answered the submit call directly with a terminal notice.
    Inline(String),
    /// A job was created; its answer streams through the wrapped poll body.
    Active(ActiveAnswerStream),
}

impl AnswerStream {
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// Type alias for the boxed byte stream.
type ByteStream = Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

/// Lazy pull-based sequence of display fragments for one answer.
///
/// Tied to a single poll response and consumed left to right; not
/// restartable. Dropping it before exhaustion cancels the answer and
/// releases the underlying connection.
pub struct ActiveAnswerStream {
    byte_stream: Option<ByteStream>,
    splitter: LineSplitter,
    reformatter: Reformatter,
    pending: VecDeque<String>,
    completed: bool,
    completed_ok: bool,
}

impl std::fmt::Debug for ActiveAnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveAnswerStream")
            .field("completed", &self.completed)
            .field("completed_ok", &self.completed_ok)
            .field("pending_len", &self.pending.len())
            .field("connected", &self.byte_stream.is_some())
            .finish_non_exhaustive()
    }
}

impl ActiveAnswerStream {
    /// Wraps a poll response body (or, in tests, any byte stream).
    pub fn new<S>(byte_stream: S) -> Self
    where
        S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            byte_stream: Some(Box::pin(byte_stream)),
            splitter: LineSplitter::new(),
            reformatter: Reformatter::new(),
            pending: VecDeque::new(),
            completed: false,
            completed_ok: false,
        }
    }

    /// Returns the next display fragment, or `None` once the answer is over.
    ///
    /// Transport failures never surface as errors here: the connection is
    /// released, a single fixed interruption notice is queued, and the
    /// sequence ends. A stream that finishes without any content yields the
    /// busy notice as its only fragment.
    pub async fn next_fragment(&mut self) -> Option<String> {
        loop {
            if let Some(fragment) = self.pending.pop_front() {
                return Some(fragment);
            }
            if self.completed {
                return None;
            }

            let Some(stream) = self.byte_stream.as_mut() else {
                self.completed = true;
                continue;
            };

            match stream.next().await {
                Some(Ok(bytes)) => match self.splitter.feed(&bytes) {
                    Ok(lines) => {
                        for line in lines {
                            let fragments = self.reformatter.push_line(&line);
                            self.pending.extend(fragments);
                        }
                    }
                    Err(e) => {
                        warn!("invalid UTF-8 in poll stream: {e}");
                        self.interrupt();
                    }
                },
                Some(Err(e)) => {
                    warn!("error reading poll stream: {e}");
                    self.interrupt();
                }
                None => {
                    if let Some(rest) = self.splitter.finish() {
                        let fragments = self.reformatter.push_line(&rest);
                        self.pending.extend(fragments);
                    }
                    // An empty result is a terminal notice, not a clean
                    // answer; post-completion side effects must not run.
                    match self.reformatter.finish() {
                        Some(notice) => self.pending.push_back(notice),
                        None => self.completed_ok = true,
                    }
                    self.byte_stream = None;
                    self.completed = true;
                }
            }
        }
    }

    /// `true` once the stream ended with actual content and without a
    /// transport failure. Gates post-completion side effects like the
    /// wallet check.
    #[must_use]
    pub const fn completed_ok(&self) -> bool {
        self.completed_ok
    }

    /// Collects every remaining fragment into a single string.
    pub async fn collect_formatted(&mut self) -> String {
        let mut collected = String::new();
        while let Some(fragment) = self.next_fragment().await {
            collected.push_str(&fragment);
        }
        collected
    }

    fn interrupt(&mut self) {
        self.byte_stream = None;
        self.pending.push_back(INTERRUPTED_NOTICE.to_string());
        self.completed = true;
    }
}

impl Drop for ActiveAnswerStream {
    fn drop(&mut self) {
        // Dropping `byte_stream` releases the poll connection; this is the
        // consumer-cancellation path when the stream was not exhausted.
        if !self.completed {
            debug!("consumer dropped the answer stream before completion");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_response(json: &str) -> SubmitResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn job_id_takes_the_last_identifier() {
        let response =
            submit_response(r#"{"code":200,"message":"","result":[111,222],"type":"success"}"#);
        assert_eq!(extract_job_id(&response).unwrap(), "222");
    }

    #[test]
    fn job_id_accepts_string_identifiers() {
        let response = submit_response(r#"{"code":200,"message":"","result":["a-1","b-2"]}"#);
        assert_eq!(extract_job_id(&response).unwrap(), "b-2");
    }

    #[test]
    fn job_id_extraction_fails_on_null_result() {
        let response = submit_response(r#"{"code":200,"message":"","result":null}"#);
        let err = extract_job_id(&response).unwrap_err();
        assert!(matches!(err, ChatError::JobIdExtraction(_)));
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn job_id_extraction_fails_on_empty_result() {
        let response = submit_response(r#"{"code":200,"message":"","result":[]}"#);
        let err = extract_job_id(&response).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn job_id_extraction_fails_on_unusable_shape() {
        let response = submit_response(r#"{"code":200,"message":"","result":[{"id":1}]}"#);
        let err = extract_job_id(&response).unwrap_err();
        assert!(matches!(err, ChatError::JobIdExtraction(_)));
    }

    #[tokio::test]
    async fn stream_reassembles_lines_split_across_chunks() {
        let chunks = vec![
            Ok(bytes::Bytes::from("hel")),
            Ok(bytes::Bytes::from("lo\nwor")),
            Ok(bytes::Bytes::from("ld\n")),
        ];
        let mut stream = ActiveAnswerStream::new(futures::stream::iter(chunks));

        assert_eq!(stream.next_fragment().await.unwrap(), "hello  \n");
        assert_eq!(stream.next_fragment().await.unwrap(), "world  \n");
        assert_eq!(stream.next_fragment().await, None);
        assert!(stream.completed_ok());
    }

    #[tokio::test]
    async fn stream_flushes_unterminated_final_line() {
        let chunks = vec![Ok(bytes::Bytes::from("first\ntail without newline"))];
        let mut stream = ActiveAnswerStream::new(futures::stream::iter(chunks));

        assert_eq!(stream.next_fragment().await.unwrap(), "first  \n");
        assert_eq!(
            stream.next_fragment().await.unwrap(),
            "tail without newline  \n"
        );
        assert_eq!(stream.next_fragment().await, None);
    }

    #[tokio::test]
    async fn dropping_an_unfinished_stream_is_clean() {
        let chunks = vec![Ok(bytes::Bytes::from("line one\nline two\n"))];
        let mut stream = ActiveAnswerStream::new(futures::stream::iter(chunks));
        assert!(stream.next_fragment().await.is_some());
        drop(stream);
    }
}
