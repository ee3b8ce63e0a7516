use common::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Inbound trigger event.
///
/// `body` is either a JSON-encoded string or an already decoded object of
/// the shape `{"message": "..."}`. An absent body reads as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "httpMethod", default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default = "empty_body")]
    pub body: Value,
}

fn empty_body() -> Value {
    Value::Object(Map::new())
}

impl ChatEvent {
    pub fn from_message(message: &str) -> Self {
        Self {
            http_method: Some("POST".to_string()),
            body: Value::String(json!({ "message": message }).to_string()),
        }
    }

    pub fn preflight() -> Self {
        Self {
            http_method: Some("OPTIONS".to_string()),
            body: Value::Null,
        }
    }

    pub fn is_preflight(&self) -> bool {
        self.http_method
            .as_deref()
            .is_some_and(|method| method.eq_ignore_ascii_case("OPTIONS"))
    }

    /// The trimmed `message` field; empty when absent.
    ///
    /// A null or undecodable body is an error, as is a message that is
    /// present but not a string.
    pub fn message(&self) -> Result<String, AppError> {
        let decoded;
        let body = match &self.body {
            Value::String(raw) => {
                decoded = serde_json::from_str::<Value>(raw)?;
                &decoded
            }
            other => other,
        };

        let fields: &Map<String, Value> = body.as_object().ok_or_else(|| {
            AppError::InternalError("request body is not a JSON object".to_string())
        })?;

        match fields.get("message") {
            None => Ok(String::new()),
            Some(Value::String(message)) => Ok(message.trim().to_string()),
            Some(_) => Err(AppError::InternalError(
                "message field is not a string".to_string(),
            )),
        }
    }
}
