use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Speaker of one prior turn in a follow-up question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior turn of conversation context sent along with a follow-up
/// question. `content_files` carries attachment references for user turns;
/// it is omitted from the wire payload when empty, matching what the
/// backend expects for assistant turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(
        rename = "contentFiles",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub content_files: Vec<String>,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            content_files: Vec::new(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            content_files: Vec::new(),
        }
    }
}

/// Envelope returned by the submit endpoint.
///
/// A non-empty `message` is an inline terminal notice (quota errors and the
/// like); otherwise `result` holds the ordered job identifiers for the
/// submitted question.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_with_backend_field_names() {
        let turn = Turn {
            role: Role::User,
            content: "1+1".to_string(),
            content_files: vec!["file-1".to_string()],
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "1+1");
        assert_eq!(json["contentFiles"][0], "file-1");
    }

    #[test]
    fn assistant_turn_omits_empty_content_files() {
        let json = serde_json::to_value(Turn::assistant("1 + 1 equals 2.")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("contentFiles").is_none());
    }

    #[test]
    fn submit_response_tolerates_missing_fields() {
        let parsed: SubmitResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.code, 0);
        assert!(parsed.message.is_empty());
        assert!(parsed.result.is_none());
        assert!(parsed.kind.is_none());
    }

    #[test]
    fn inline_notice_arrives_in_the_message_field() {
        let parsed: SubmitResponse = serde_json::from_str(
            r#"{"code":200,"message":"Insufficient balance","result":null}"#,
        )
        .unwrap();
        assert_eq!(parsed.message, "Insufficient balance");
        assert!(parsed.result.is_none());
    }

    #[test]
    fn submit_response_parses_success_envelope() {
        let parsed: SubmitResponse = serde_json::from_str(
            r#"{"code":200,"extras":null,"message":"","result":[18761311234501,18761311236421],"type":"success"}"#,
        )
        .unwrap();
        assert_eq!(parsed.code, 200);
        assert_eq!(parsed.kind.as_deref(), Some("success"));
        assert_eq!(parsed.result.unwrap().as_array().unwrap().len(), 2);
    }
}
