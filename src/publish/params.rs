//! Request intake and parameter validation.
//!
//! # Responsibilities
//! - Decode the inbound body (JSON first, URL-encoded form as fallback)
//! - Check the required parameters and the optional ones' constraints
//! - Produce a typed [`PublishRequest`] with normalized URLs
//!
//! Values are truthy-checked the way loosely typed HTTP callers expect:
//! absent, `null`, `""`, `0` and `false` all count as "not given".

use serde_json::{Map, Value};
use thiserror::Error;

use crate::publish::site::{normalize_resource_url, normalize_site_url, UrlError};

/// Title used when the caller does not supply one.
pub const DEFAULT_TITLE: &str = "New WordPress Post";

/// Parameters that must be present for a publish request, in reporting order.
pub const REQUIRED_PARAMS: [&str; 4] = [
    "wordpress_api_key",
    "wordpressurl",
    "featuredimageurl",
    "post_content",
];

/// Undecoded request parameters keyed by name.
pub type RawParams = Map<String, Value>;

/// Decode a request body into parameters.
///
/// JSON is tried first. When the body is not JSON it is read as
/// `application/x-www-form-urlencoded`. JSON that is not an object carries
/// no parameters.
pub fn parse_body(body: &[u8]) -> RawParams {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => RawParams::new(),
        Err(_) => url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect(),
    }
}

/// Why a publish request was refused before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParams(Vec<&'static str>),

    #[error("Invalid status. Must be either \"draft\" or \"publish\"")]
    InvalidStatus,

    #[error("{0} must be a valid integer")]
    NotAnInteger(&'static str),

    #[error("Invalid {param}: {reason}")]
    InvalidUrl { param: &'static str, reason: String },
}

/// Publication state requested for the new post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Publish,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated publish request.
#[derive(Clone, PartialEq)]
pub struct PublishRequest {
    pub api_key: String,
    /// Site root without trailing slash.
    pub site_url: String,
    pub image_url: String,
    pub content: String,
    pub title: String,
    pub status: PostStatus,
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
}

impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRequest")
            .field("api_key", &mask_key(&self.api_key))
            .field("site_url", &self.site_url)
            .field("image_url", &self.image_url)
            .field("title", &self.title)
            .field("status", &self.status)
            .field("author_id", &self.author_id)
            .field("category_id", &self.category_id)
            .finish_non_exhaustive()
    }
}

impl PublishRequest {
    /// Validate raw parameters. Checks run in a fixed order and the first
    /// failing check is reported.
    pub fn from_params(params: &RawParams) -> Result<Self, ValidationError> {
        let missing: Vec<&'static str> = REQUIRED_PARAMS
            .iter()
            .copied()
            .filter(|name| !is_truthy(params.get(*name)))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingParams(missing));
        }

        let status = match given(params, "status") {
            None => PostStatus::default(),
            Some(Value::String(s)) if s == "draft" => PostStatus::Draft,
            Some(Value::String(s)) if s == "publish" => PostStatus::Publish,
            Some(_) => return Err(ValidationError::InvalidStatus),
        };

        let author_id = optional_integer(params, "author_id")?;
        let category_id = optional_integer(params, "category_id")?;

        let site_url = text(params, "wordpressurl");
        let site_url = normalize_site_url(&site_url).map_err(|e| url_error("wordpressurl", e))?;
        let image_url = text(params, "featuredimageurl");
        let image_url =
            normalize_resource_url(&image_url).map_err(|e| url_error("featuredimageurl", e))?;

        let title = given(params, "title")
            .map(value_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Ok(Self {
            api_key: text(params, "wordpress_api_key"),
            site_url,
            image_url,
            content: text(params, "post_content"),
            title,
            status,
            author_id,
            category_id,
        })
    }
}

fn url_error(param: &'static str, err: UrlError) -> ValidationError {
    ValidationError::InvalidUrl {
        param,
        reason: err.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn given<'a>(params: &'a RawParams, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| is_truthy(Some(*v)))
}

fn text(params: &RawParams, name: &str) -> String {
    params.get(name).map(value_text).unwrap_or_default()
}

/// Textual form of a parameter value. Strings are taken verbatim.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_integer(
    params: &RawParams,
    name: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match given(params, name) {
        None => Ok(None),
        Some(value) => as_integer(value)
            .map(Some)
            .ok_or(ValidationError::NotAnInteger(name)),
    }
}

/// First `f64` past `i64::MAX` (2^63).
const I64_LIMIT: f64 = 9.223372036854775808e18;

/// Numeric conversion that accepts numbers, booleans, decimal strings and
/// `0x`/`0o`/`0b` prefixed strings, but only when the result is integral
/// and fits in an `i64`.
fn as_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => numeric_string(s.trim())?,
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if number.is_finite() && number.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&number) {
        Some(number as i64)
    } else {
        None
    }
}

/// Value of a trimmed numeric string. Radix prefixes take unsigned digits
/// only; decimal strings may carry a sign, a fraction and an exponent.
fn numeric_string(s: &str) -> Option<f64> {
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    if s.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c)) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

/// Masked form of an API key, safe for logs.
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "***".to_string()
    } else {
        format!("{visible}***")
    }
}
