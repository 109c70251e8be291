//! Typed client for the publisher service and its admin API.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::publish::params::{mask_key, DEFAULT_TITLE};
use crate::publish::site::{normalize_site_url, UrlError};

/// Errors raised by [`PublisherClient`] and [`AdminClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("An error occurred: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse response as JSON: {source}\nRaw response: {raw}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Body sent to the publish endpoint.
#[derive(Clone, Serialize)]
pub struct PublishPayload {
    pub wordpress_api_key: String,
    pub wordpressurl: String,
    pub featuredimageurl: String,
    pub post_content: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl PublishPayload {
    /// Payload with the default title and `draft` status.
    pub fn new(
        api_key: impl Into<String>,
        site_url: impl Into<String>,
        image_url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            wordpress_api_key: api_key.into(),
            wordpressurl: site_url.into(),
            featuredimageurl: image_url.into(),
            post_content: content.into(),
            title: DEFAULT_TITLE.to_string(),
            status: "draft".to_string(),
            author_id: None,
            category_id: None,
        }
    }

    /// JSON form with the API key replaced by `***`, for logs.
    pub fn masked(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(key) = value.get_mut("wordpress_api_key") {
            *key = Value::String("***".to_string());
        }
        value
    }
}

impl std::fmt::Debug for PublishPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishPayload")
            .field("wordpress_api_key", &mask_key(&self.wordpress_api_key))
            .field("wordpressurl", &self.wordpressurl)
            .field("featuredimageurl", &self.featuredimageurl)
            .field("title", &self.title)
            .field("status", &self.status)
            .field("author_id", &self.author_id)
            .field("category_id", &self.category_id)
            .finish_non_exhaustive()
    }
}

/// What the publish endpoint answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReply {
    pub status: StatusCode,
    pub body: Value,
}

impl PublishReply {
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK && self.body["success"].as_bool().unwrap_or(false)
    }

    /// One-paragraph, human-readable account of the outcome.
    pub fn summary(&self) -> String {
        let body = &self.body;
        if self.is_success() {
            let mut parts = vec![
                text_of(&body["message"]),
                format!("Post ID: {}", text_of(&body["post_id"])),
                format!("URL (ID-based): {}", text_of(&body["post_url"])),
                format!(
                    "URL (slug-based): {}",
                    present(&body["post_url_slug"])
                        .map(text_of)
                        .unwrap_or_else(|| "Not available".to_string())
                ),
            ];
            if let Some(media_id) = present(&body["media_id"]) {
                parts.push(format!("Media ID: {}", text_of(media_id)));
            }
            if let Some(author_id) = present(&body["author_id"]) {
                parts.push(format!("Author ID: {}", text_of(author_id)));
            }
            return parts.join(". ");
        }

        let mut message = present(&body["error"])
            .map(text_of)
            .unwrap_or_else(|| "Unknown error".to_string());
        if let Some(data) = present(&body["response_data"]) {
            message.push_str(&format!("\nResponse data: {}", pretty(data)));
        }
        if let Some(raw) = present(&body["raw_response"]) {
            message.push_str(&format!("\nRaw response: {}", text_of(raw)));
        }
        if let Some(endpoint) = present(&body["details"]["endpoint"]) {
            message.push_str(&format!("\nEndpoint: {}", text_of(endpoint)));
        }
        format!("Request failed: {message}")
    }
}

fn present(value: &Value) -> Option<&Value> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// What an admin endpoint answered. `body` is `null` when the response
/// had no content.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminReply {
    pub status: StatusCode,
    pub body: Value,
}

impl AdminReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Client for the publish endpoint.
pub struct PublisherClient {
    client: Client,
    service_url: String,
}

impl PublisherClient {
    /// `service_url` may omit the scheme; `https://` is assumed.
    pub fn new(service_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(),
            service_url: normalize_site_url(service_url)?,
        })
    }

    /// Use a preconfigured reqwest client (timeouts, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Send a publish request. Non-success statuses are returned as a
    /// [`PublishReply`], not as errors.
    pub async fn publish(&self, payload: &PublishPayload) -> Result<PublishReply, ClientError> {
        tracing::info!(payload = %payload.masked(), "Sending publish request");

        let resp = self
            .client
            .post(&self.service_url)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!(status = %status, "Publish response received");

        let body = serde_json::from_str(&text)
            .map_err(|source| ClientError::InvalidJson { raw: text, source })?;
        Ok(PublishReply { status, body })
    }
}

/// Client for the `/admin` API.
pub struct AdminClient {
    client: Client,
    base_url: String,
    token: String,
}

impl AdminClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(),
            base_url: normalize_site_url(base_url)?,
            token: token.to_string(),
        })
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub async fn status(&self) -> Result<AdminReply, ClientError> {
        self.send(reqwest::Method::GET, "/admin/status").await
    }

    pub async fn show_key(&self) -> Result<AdminReply, ClientError> {
        self.send(reqwest::Method::GET, "/admin/api-key").await
    }

    pub async fn regenerate_key(&self) -> Result<AdminReply, ClientError> {
        self.send(reqwest::Method::POST, "/admin/api-key/regenerate")
            .await
    }

    pub async fn uninstall(&self) -> Result<AdminReply, ClientError> {
        self.send(reqwest::Method::DELETE, "/admin/api-key").await
    }

    async fn send(&self, method: reqwest::Method, path: &str) -> Result<AdminReply, ClientError> {
        let resp = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|source| ClientError::InvalidJson { raw: text, source })?
        };
        Ok(AdminReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: Value) -> PublishReply {
        PublishReply {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn test_summary_success_with_title() {
        let summary = reply(
            200,
            json!({
                "success": true,
                "post_id": 123,
                "post_url": "https://example.com/post/123",
                "post_url_slug": "https://example.com/custom-title/",
                "media_id": 456,
                "message": "Successfully created publish post",
            }),
        )
        .summary();

        assert_eq!(
            summary,
            "Successfully created publish post. Post ID: 123. \
             URL (ID-based): https://example.com/post/123. \
             URL (slug-based): https://example.com/custom-title/. Media ID: 456"
        );
    }

    #[test]
    fn test_summary_success_with_author() {
        let summary = reply(
            200,
            json!({
                "success": true,
                "post_id": 123,
                "post_url": "https://example.com/post/123",
                "media_id": 456,
                "author_id": 789,
                "message": "Successfully created draft post",
            }),
        )
        .summary();

        assert!(summary.contains("draft post"));
        assert!(summary.contains("URL (slug-based): Not available"));
        assert!(summary.ends_with("Author ID: 789"));
    }

    #[test]
    fn test_summary_server_error() {
        let summary = reply(500, json!({"success": false, "error": "Internal server error"}))
            .summary();
        assert_eq!(summary, "Request failed: Internal server error");
    }

    #[test]
    fn test_summary_validation_error() {
        let summary = reply(
            400,
            json!({"success": false, "error": "author_id must be a valid integer"}),
        )
        .summary();
        assert!(summary.starts_with("Request failed"));
        assert!(summary.contains("author_id must be a valid integer"));
    }

    #[test]
    fn test_summary_includes_failure_details() {
        let summary = reply(
            403,
            json!({
                "success": false,
                "error": "WordPress post creation failed: forbidden",
                "status_code": 403,
                "details": {"endpoint": "posts", "headers": {}},
            }),
        )
        .summary();
        assert_eq!(
            summary,
            "Request failed: WordPress post creation failed: forbidden\nEndpoint: posts"
        );

        let summary = reply(
            502,
            json!({
                "success": false,
                "error": "WordPress media upload succeeded but no media ID was returned",
                "response_data": {"foo": 1},
            }),
        )
        .summary();
        assert!(summary.contains("\nResponse data: {\n  \"foo\": 1\n}"));
    }

    #[test]
    fn test_success_flag_needs_200() {
        let r = reply(201, json!({"success": true}));
        assert!(!r.is_success());
        assert!(r.summary().starts_with("Request failed: Unknown error"));
    }

    #[test]
    fn test_admin_reply_success() {
        let removed = AdminReply {
            status: StatusCode::NO_CONTENT,
            body: Value::Null,
        };
        assert!(removed.is_success());

        let denied = AdminReply {
            status: StatusCode::UNAUTHORIZED,
            body: json!({"success": false, "error": "Unauthorized"}),
        };
        assert!(!denied.is_success());
    }

    #[test]
    fn test_payload_masking() {
        let mut payload = PublishPayload::new(
            "super-secret-key",
            "example.com",
            "https://example.com/image.jpg",
            "<h1>Test</h1>",
        );
        payload.author_id = Some(7);

        let masked = payload.masked();
        assert_eq!(masked["wordpress_api_key"], "***");
        assert_eq!(masked["author_id"], 7);
        assert!(masked.get("category_id").is_none());
        assert!(!format!("{payload:?}").contains("super-secret-key"));
    }

    #[test]
    fn test_service_url_without_protocol() {
        let client = PublisherClient::new("test-worker.example.com/").unwrap();
        assert_eq!(client.service_url(), "https://test-worker.example.com");
    }
}
