use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub auth_token: String,
    pub topic_id: i64,
    pub source_token: Option<String>,
    pub accept_language: String,
    pub model: Option<String>,
    pub markdown_hint: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            base_url: env::var("CHAT_BASE_URL").map_err(|e| format!("CHAT_BASE_URL: {e}"))?,
            auth_token: env::var("CHAT_AUTH_TOKEN").map_err(|e| format!("CHAT_AUTH_TOKEN: {e}"))?,
            topic_id: env::var("CHAT_TOPIC_ID")
                .map_err(|e| format!("CHAT_TOPIC_ID: {e}"))?
                .parse()
                .map_err(|e| format!("CHAT_TOPIC_ID: {e}"))?,
            source_token: env::var("CHAT_SOURCE_TOKEN").ok(),
            accept_language: env::var("CHAT_ACCEPT_LANGUAGE")
                .unwrap_or_else(|_| "en-US".to_string()),
            model: env::var("CHAT_MODEL").ok(),
            markdown_hint: env::var("CHAT_MARKDOWN_HINT")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
