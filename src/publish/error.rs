//! Failure classification for publish requests.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::publish::params::ValidationError;
use crate::wordpress::{Endpoint, WordPressError};

/// Every way a publish request can fail, mapped to the status and JSON
/// envelope returned to the caller.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Failed to parse request body. Expected JSON or form data.")]
    UnreadableBody { status: StatusCode, details: String },

    #[error("request timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] WordPressError),
}

impl PublishError {
    /// HTTP status returned for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            PublishError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            PublishError::UnreadableBody { status, .. } => *status,
            PublishError::Validation(_) => StatusCode::BAD_REQUEST,
            PublishError::TimedOut(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PublishError::Upstream(err) => match err {
                WordPressError::ImageStatus(_) => StatusCode::BAD_GATEWAY,
                WordPressError::NotAnImage => StatusCode::BAD_REQUEST,
                WordPressError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                WordPressError::MediaUnreadable(_)
                | WordPressError::MediaNotJson { .. }
                | WordPressError::MissingMediaId(_) => StatusCode::BAD_GATEWAY,
                WordPressError::InvalidPostResponse(_) | WordPressError::Transport(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::MethodNotAllowed => "method_not_allowed",
            PublishError::UnreadableBody { .. } => "unreadable_body",
            PublishError::Validation(_) => "validation",
            PublishError::TimedOut(_) => "timeout",
            PublishError::Upstream(err) => match err {
                WordPressError::ImageStatus(_) | WordPressError::NotAnImage => "image",
                WordPressError::Rejected { endpoint, .. } => match endpoint {
                    Endpoint::Media => "media_rejected",
                    Endpoint::Posts => "post_rejected",
                },
                WordPressError::MediaUnreadable(_)
                | WordPressError::MediaNotJson { .. }
                | WordPressError::MissingMediaId(_) => "media_response",
                WordPressError::InvalidPostResponse(_) | WordPressError::Transport(_) => {
                    "internal"
                }
            },
        }
    }

    /// JSON envelope returned to the caller. Always has `success: false`
    /// and an `error` message.
    pub fn to_body(&self) -> Value {
        match self {
            PublishError::UnreadableBody { details, .. } => json!({
                "success": false,
                "error": self.to_string(),
                "details": details,
            }),
            PublishError::TimedOut(_) => json!({
                "success": false,
                "error": format!("Internal server error: {self}"),
            }),
            PublishError::Upstream(err) => upstream_body(err),
            _ => json!({
                "success": false,
                "error": self.to_string(),
            }),
        }
    }
}

fn upstream_body(err: &WordPressError) -> Value {
    match err {
        WordPressError::Rejected {
            endpoint,
            status,
            headers,
            ..
        } => json!({
            "success": false,
            "error": err.to_string(),
            "status_code": status,
            "details": {
                "endpoint": endpoint.as_str(),
                "headers": headers,
            },
        }),
        WordPressError::MediaUnreadable(source) => json!({
            "success": false,
            "error": err.to_string(),
            "error_details": source.to_string(),
        }),
        WordPressError::MediaNotJson { raw, parse_error } => json!({
            "success": false,
            "error": err.to_string(),
            "raw_response": raw,
            "parse_error": parse_error,
        }),
        WordPressError::MissingMediaId(response) => json!({
            "success": false,
            "error": err.to_string(),
            "response_data": response,
        }),
        WordPressError::InvalidPostResponse(_) | WordPressError::Transport(_) => json!({
            "success": false,
            "error": format!("Internal server error: {err}"),
        }),
        WordPressError::ImageStatus(_) | WordPressError::NotAnImage => json!({
            "success": false,
            "error": err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_method_not_allowed() {
        let err = PublishError::MethodNotAllowed;
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            err.to_body(),
            json!({"success": false, "error": "Method not allowed"})
        );
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = PublishError::from(ValidationError::NotAnInteger("author_id"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body()["error"], "author_id must be a valid integer");
    }

    #[test]
    fn test_image_failures() {
        let err = PublishError::from(WordPressError::ImageStatus(404));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_body()["error"], "Failed to fetch image: HTTP 404");

        let err = PublishError::from(WordPressError::NotAnImage);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rejection_mirrors_upstream_status() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        let err = PublishError::from(WordPressError::Rejected {
            endpoint: Endpoint::Media,
            status: 401,
            message: "Invalid API key".into(),
            headers,
        });

        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.kind(), "media_rejected");
        assert_eq!(
            err.to_body(),
            json!({
                "success": false,
                "error": "WordPress media upload failed: Invalid API key",
                "status_code": 401,
                "details": {
                    "endpoint": "media",
                    "headers": {"content-type": "application/json"},
                },
            })
        );
    }

    #[test]
    fn test_missing_media_id_body() {
        let err = PublishError::from(WordPressError::MissingMediaId(json!({"foo": 1})));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_body()["response_data"], json!({"foo": 1}));
    }

    #[test]
    fn test_invalid_post_response_is_internal() {
        let err = PublishError::from(WordPressError::InvalidPostResponse("eof".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_body()["error"],
            "Internal server error: invalid post creation response: eof"
        );
    }

    #[test]
    fn test_timeout_is_internal_error() {
        let err = PublishError::TimedOut(Duration::from_secs(90));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "timeout");
        assert_eq!(
            err.to_body(),
            json!({
                "success": false,
                "error": "Internal server error: request timed out after 90s",
            })
        );
    }

    #[test]
    fn test_unreadable_body_keeps_status() {
        let err = PublishError::UnreadableBody {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            details: "length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_body()["details"], "length limit exceeded");
    }
}
