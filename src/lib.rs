//! WordPress publisher library.
//!
//! Accepts a publish request, fetches the featured image, uploads it to the
//! target site's media library and creates a post that uses it as the
//! featured image. Also owns the site API key option and ships a typed
//! client for the service.

pub mod admin;
pub mod client;
pub mod config;
pub mod http;
pub mod keys;
pub mod lifecycle;
pub mod observability;
pub mod publish;
pub mod wordpress;

pub use config::PublisherConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
