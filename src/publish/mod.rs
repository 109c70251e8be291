//! Publish pipeline.
//!
//! # Data Flow
//! ```text
//! request body
//!     → params.rs (JSON or form → RawParams → PublishRequest)
//!     → Publisher::publish
//!         fetch image → upload media → create post
//!     → PublishOutcome (success envelope) | PublishError (failure envelope)
//! ```

pub mod error;
pub mod params;
pub mod site;

use serde::Serialize;
use serde_json::Value;

pub use error::PublishError;
pub use params::{parse_body, PostStatus, PublishRequest, RawParams, ValidationError};

use crate::wordpress::{MediaId, NewPost, WordPressClient};

/// Success envelope returned after a post was created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishOutcome {
    pub success: bool,
    pub post_id: Value,
    pub post_url: Option<String>,
    pub post_url_slug: String,
    pub media_id: MediaId,
    pub author_id: Value,
    pub message: String,
}

/// Runs the fetch → upload → create-post sequence for one request.
#[derive(Debug, Clone)]
pub struct Publisher {
    client: WordPressClient,
}

impl Publisher {
    pub fn new(client: WordPressClient) -> Self {
        Self { client }
    }

    /// Publish a validated request. Stops at the first failing step.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let image = self.client.fetch_image(&request.image_url).await?;

        let media_id = self
            .client
            .upload_media(&request.site_url, &request.api_key, image)
            .await?;

        let post = NewPost {
            title: &request.title,
            content: &request.content,
            status: request.status,
            featured_media: media_id,
            author: request.author_id,
            categories: request.category_id.map(|id| vec![id]),
        };
        let created = self
            .client
            .create_post(&request.site_url, &request.api_key, &post)
            .await?;

        let slug = created
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| site::slugify(&request.title));

        tracing::info!(
            post_id = %created.id,
            media_id = %media_id,
            status = %request.status,
            "Post created"
        );

        Ok(PublishOutcome {
            success: true,
            post_id: created.id,
            post_url: created.link,
            post_url_slug: site::slug_url(&request.site_url, &slug),
            media_id,
            author_id: created.author,
            message: format!("Successfully created {} post", request.status),
        })
    }
}
