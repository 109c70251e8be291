//! Outbound HTTP calls: image fetch, media upload and post creation.
//!
//! # Responsibilities
//! - Share one connection pool across all upstream calls
//! - Apply connect and per-call timeouts from configuration
//! - Classify upstream answers into [`WordPressError`] variants
//! - Keep the site API key out of logs

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::config::PublisherConfig;
use crate::observability::metrics;
use crate::publish::params::mask_key;
use crate::wordpress::types::{
    error_text, parse_media_response, CreatedPost, Endpoint, FetchedImage, MediaId, NewPost,
    WordPressError, WordPressResult, API_KEY_HEADER,
};

/// Client for image hosts and WordPress REST endpoints.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    http: Client,
}

impl WordPressClient {
    /// Build a client with the configured timeouts and user agent.
    pub fn new(config: &PublisherConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .user_agent(config.upstream.user_agent.clone());
        if config.upstream.no_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self { http })
    }

    /// Download the featured image and check that it is one.
    pub async fn fetch_image(&self, url: &str) -> WordPressResult<FetchedImage> {
        let started = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();
        metrics::record_upstream("image", status.as_u16(), started);

        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Image host returned an error");
            return Err(WordPressError::ImageStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|ct| ct.starts_with("image/"))
            .ok_or(WordPressError::NotAnImage)?;

        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(
            url = %url,
            content_type = %content_type,
            size = bytes.len(),
            "Fetched featured image"
        );

        Ok(FetchedImage::new(bytes, content_type))
    }

    /// Upload an image to `<site>/wp-json/wp/v2/media` as multipart form data.
    pub async fn upload_media(
        &self,
        site_root: &str,
        api_key: &str,
        image: FetchedImage,
    ) -> WordPressResult<MediaId> {
        let url = Endpoint::Media.url(site_root);
        tracing::info!(
            url = %url,
            api_key = %mask_key(api_key),
            file_name = %image.file_name,
            size = image.bytes.len(),
            "Uploading media to WordPress"
        );

        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("file", part);

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        metrics::record_upstream(Endpoint::Media.as_str(), status.as_u16(), started);
        tracing::debug!(status = %status, "Media upload response received");

        if !status.is_success() {
            return Err(rejected(Endpoint::Media, response).await);
        }

        let raw = response.text().await.map_err(WordPressError::MediaUnreadable)?;
        let body = parse_media_response(&raw)?;

        match MediaId::from_response(&body) {
            Some(id) => {
                tracing::info!(media_id = %id, "Media uploaded");
                Ok(id)
            }
            None => {
                tracing::warn!(response = %body, "Media upload response has no ID");
                Err(WordPressError::MissingMediaId(body))
            }
        }
    }

    /// Create a post at `<site>/wp-json/wp/v2/posts`.
    pub async fn create_post(
        &self,
        site_root: &str,
        api_key: &str,
        post: &NewPost<'_>,
    ) -> WordPressResult<CreatedPost> {
        let url = Endpoint::Posts.url(site_root);
        tracing::info!(
            url = %url,
            api_key = %mask_key(api_key),
            status = %post.status,
            featured_media = %post.featured_media,
            "Creating WordPress post"
        );

        let started = Instant::now();
        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(post)
            .send()
            .await?;
        let status = response.status();
        metrics::record_upstream(Endpoint::Posts.as_str(), status.as_u16(), started);

        if !status.is_success() {
            return Err(rejected(Endpoint::Posts, response).await);
        }

        let raw = response.text().await?;
        serde_json::from_str::<CreatedPost>(&raw)
            .map_err(|e| WordPressError::InvalidPostResponse(e.to_string()))
    }
}

/// Turn a non-success WordPress answer into [`WordPressError::Rejected`].
async fn rejected(endpoint: Endpoint, response: reqwest::Response) -> WordPressError {
    let status = response.status().as_u16();
    let headers = header_map(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = error_text(&body);

    tracing::warn!(
        endpoint = endpoint.as_str(),
        status,
        message = %message,
        "WordPress rejected request"
    );

    WordPressError::Rejected {
        endpoint,
        status,
        message,
        headers,
    }
}

/// Flatten response headers into a name → value map for error envelopes.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SET_COOKIE};

    #[test]
    fn test_header_map_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let map = header_map(&headers);
        assert_eq!(map["content-type"], "application/json");
        assert_eq!(map["set-cookie"], "a=1, b=2");
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            Endpoint::Media.url("https://example.com"),
            "https://example.com/wp-json/wp/v2/media"
        );
        assert_eq!(
            Endpoint::Posts.url("https://example.com/blog"),
            "https://example.com/blog/wp-json/wp/v2/posts"
        );
    }
}
