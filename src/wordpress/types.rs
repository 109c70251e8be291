//! WordPress REST types and error definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::publish::params::PostStatus;

/// Header the connector plugin reads the site API key from.
pub const API_KEY_HEADER: &str = "IWC-API-KEY";

/// WordPress REST endpoint touched by the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Media,
    Posts,
}

impl Endpoint {
    /// Path segment under `/wp-json/wp/v2/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Media => "media",
            Endpoint::Posts => "posts",
        }
    }

    pub fn url(self, site_root: &str) -> String {
        format!("{}/wp-json/wp/v2/{}", site_root, self.as_str())
    }

    fn failure_label(self) -> &'static str {
        match self {
            Endpoint::Media => "WordPress media upload failed",
            Endpoint::Posts => "WordPress post creation failed",
        }
    }
}

/// Identifier of an uploaded media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

impl MediaId {
    /// Pull the media ID out of an upload response, trying `id` then `ID`.
    /// Integral numbers and numeric strings count, including float forms
    /// such as `12.0`. Zero, empty and non-numeric values do not.
    pub fn from_response(value: &Value) -> Option<Self> {
        ["id", "ID"]
            .iter()
            .filter_map(|key| value.get(key))
            .find_map(|v| {
                let id = match v {
                    Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral_id)),
                    Value::String(s) => {
                        let s = s.trim();
                        s.parse::<u64>()
                            .ok()
                            .or_else(|| s.parse::<f64>().ok().and_then(integral_id))
                    }
                    _ => None,
                };
                id.filter(|id| *id != 0)
            })
            .map(MediaId)
    }
}

/// 2^64, the first `f64` past `u64::MAX`.
const U64_LIMIT: f64 = 1.8446744073709552e19;

fn integral_id(f: f64) -> Option<u64> {
    (f.is_finite() && f.fract() == 0.0 && f > 0.0 && f < U64_LIMIT).then(|| f as u64)
}

impl std::fmt::Display for MediaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image bytes ready to be uploaded.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl FetchedImage {
    pub fn new(bytes: Vec<u8>, content_type: String) -> Self {
        let file_name = upload_file_name(&content_type);
        Self {
            bytes,
            content_type,
            file_name,
        }
    }
}

/// File name given to the uploaded media item.
pub fn upload_file_name(content_type: &str) -> String {
    let ext = if content_type == "image/jpeg" { "jpg" } else { "png" };
    format!("featured-image.{ext}")
}

/// Body of `POST /wp-json/wp/v2/posts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: PostStatus,
    pub featured_media: MediaId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<i64>>,
}

/// The subset of a created post the publisher reports back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedPost {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub author: Value,
}

/// Errors that can occur while talking to image hosts and WordPress.
#[derive(Debug, Error)]
pub enum WordPressError {
    /// Image host answered with a non-success status.
    #[error("Failed to fetch image: HTTP {0}")]
    ImageStatus(u16),

    /// Image host answered with something other than `image/*`.
    #[error("Invalid content type. URL must point to an image file.")]
    NotAnImage,

    /// WordPress answered a media or post call with a non-success status.
    #[error("{}: {message}", .endpoint.failure_label())]
    Rejected {
        endpoint: Endpoint,
        status: u16,
        message: String,
        headers: BTreeMap<String, String>,
    },

    /// The media upload succeeded but its body could not be read.
    #[error("Failed to read media upload response")]
    MediaUnreadable(#[source] reqwest::Error),

    /// The media upload body was not JSON.
    #[error("Failed to parse media upload response as JSON")]
    MediaNotJson { raw: String, parse_error: String },

    /// The media upload body had no usable `id`/`ID`.
    #[error("WordPress media upload succeeded but no media ID was returned")]
    MissingMediaId(Value),

    /// The post creation body could not be decoded.
    #[error("invalid post creation response: {0}")]
    InvalidPostResponse(String),

    /// Network or protocol failure before any response was usable.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for WordPress operations.
pub type WordPressResult<T> = Result<T, WordPressError>;

/// Extract the human-readable reason from an error body: its JSON
/// `message`, else its JSON `error`, else the raw text.
pub fn error_text(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    ["message", "error"]
        .iter()
        .filter_map(|key| json.get(key))
        .find_map(|v| match v {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| body.to_string())
}

/// Decode a media upload body, unwrapping one level of double encoding.
pub fn parse_media_response(raw: &str) -> WordPressResult<Value> {
    let not_json = |e: serde_json::Error| WordPressError::MediaNotJson {
        raw: raw.to_string(),
        parse_error: e.to_string(),
    };

    match serde_json::from_str::<Value>(raw).map_err(not_json)? {
        Value::String(inner) => serde_json::from_str(&inner).map_err(not_json),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_id_lookup() {
        assert_eq!(MediaId::from_response(&json!({"id": 42})), Some(MediaId(42)));
        assert_eq!(MediaId::from_response(&json!({"ID": "17"})), Some(MediaId(17)));
        assert_eq!(MediaId::from_response(&json!({"id": 12.0})), Some(MediaId(12)));
        assert_eq!(MediaId::from_response(&json!({"id": "12.0"})), Some(MediaId(12)));
        assert_eq!(MediaId::from_response(&json!({"id": 12.5})), None);
        assert_eq!(MediaId::from_response(&json!({"id": 0, "ID": 5})), Some(MediaId(5)));
        assert_eq!(MediaId::from_response(&json!({"id": null})), None);
        assert_eq!(MediaId::from_response(&json!({"source_url": "x"})), None);
        assert_eq!(MediaId::from_response(&json!([1, 2])), None);
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(upload_file_name("image/jpeg"), "featured-image.jpg");
        assert_eq!(upload_file_name("image/png"), "featured-image.png");
        assert_eq!(upload_file_name("image/webp"), "featured-image.png");
    }

    #[test]
    fn test_new_post_omits_unset_fields() {
        let post = NewPost {
            title: "Hello",
            content: "<p>x</p>",
            status: PostStatus::Draft,
            featured_media: MediaId(9),
            author: None,
            categories: None,
        };
        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            json!({"title": "Hello", "content": "<p>x</p>", "status": "draft", "featured_media": 9})
        );

        let post = NewPost {
            author: Some(3),
            categories: Some(vec![7]),
            status: PostStatus::Publish,
            ..post
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["author"], json!(3));
        assert_eq!(value["categories"], json!([7]));
        assert_eq!(value["status"], json!("publish"));
    }

    #[test]
    fn test_error_text_prefers_message() {
        assert_eq!(
            error_text(r#"{"code":"rest_forbidden","message":"Sorry, you are not allowed."}"#),
            "Sorry, you are not allowed."
        );
        assert_eq!(error_text(r#"{"error":"Invalid API key"}"#), "Invalid API key");
        assert_eq!(error_text(r#"{"message":"","code":"x"}"#), r#"{"message":"","code":"x"}"#);
        assert_eq!(error_text("<html>502</html>"), "<html>502</html>");
    }

    #[test]
    fn test_parse_media_response_double_encoded() {
        let inner = json!({"id": 12}).to_string();
        let raw = serde_json::to_string(&inner).unwrap();
        assert_eq!(parse_media_response(&raw).unwrap(), json!({"id": 12}));
    }

    #[test]
    fn test_parse_media_response_garbage() {
        match parse_media_response("<html>oops</html>").unwrap_err() {
            WordPressError::MediaNotJson { raw, .. } => assert_eq!(raw, "<html>oops</html>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejected_message() {
        let err = WordPressError::Rejected {
            endpoint: Endpoint::Posts,
            status: 403,
            message: "nope".into(),
            headers: BTreeMap::new(),
        };
        assert_eq!(err.to_string(), "WordPress post creation failed: nope");
    }
}
