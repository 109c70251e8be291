//! WordPress integration subsystem.
//!
//! # Data Flow
//! ```text
//! PublishRequest
//!     → client.rs fetch_image   (GET image URL, check image/*)
//!     → client.rs upload_media  (POST /wp-json/wp/v2/media, multipart)
//!     → client.rs create_post   (POST /wp-json/wp/v2/posts, JSON)
//!     → CreatedPost
//! ```
//!
//! # Design Decisions
//! - Calls run strictly in sequence; the first failure ends the run
//! - Authentication is the connector plugin's `IWC-API-KEY` header
//! - Upstream status codes are preserved for WordPress rejections

pub mod client;
pub mod types;

pub use client::WordPressClient;
pub use types::{
    CreatedPost, Endpoint, FetchedImage, MediaId, NewPost, WordPressError, WordPressResult,
};
