use common::error::AppError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::response::{HandlerResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_SERVER_ERROR};

#[derive(Error, Debug, Serialize, Clone)]
pub enum HandlerError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<AppError> for HandlerError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::ValidationError(msg),
            other => {
                tracing::error!("Internal error: {:?}", other);
                Self::InternalError(other.to_string())
            }
        }
    }
}

impl HandlerError {
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InternalError(_) => STATUS_INTERNAL_SERVER_ERROR,
            Self::ValidationError(_) => STATUS_BAD_REQUEST,
        }
    }

    /// Internal details never reach the body.
    pub fn into_response(self) -> HandlerResponse {
        let status = self.status_code();
        let message = match self {
            Self::InternalError(_) => "Internal server error".to_string(),
            Self::ValidationError(message) => message,
        };

        HandlerResponse::json(status, &json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_to_handler_error_conversion() {
        let validation = AppError::Validation("invalid input".to_string());
        let handler_error = HandlerError::from(validation);
        assert!(
            matches!(handler_error, HandlerError::ValidationError(msg) if msg == "invalid input")
        );

        let internal_error = AppError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "io error",
        ));
        let handler_error = HandlerError::from(internal_error);
        assert!(matches!(handler_error, HandlerError::InternalError(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            HandlerError::InternalError("boom".into()).status_code(),
            500
        );
        assert_eq!(
            HandlerError::ValidationError("bad".into()).status_code(),
            400
        );
    }

    #[test]
    fn test_internal_error_sanitization() {
        let sensitive_info = "api key rejected: sk-live-123";
        let handler_error = HandlerError::InternalError(sensitive_info.to_string());

        assert_eq!(handler_error.to_string(), "Internal server error");

        let response = handler_error.into_response();
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, r#"{"error":"Internal server error"}"#);
        assert!(!response.body.contains("sk-live"));
    }

    #[test]
    fn test_validation_message_is_returned_verbatim() {
        let response = HandlerError::ValidationError("Message is required".into()).into_response();

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"error":"Message is required"}"#);
    }
}
