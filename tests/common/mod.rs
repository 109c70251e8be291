//! Shared utilities for integration testing: a mock WordPress site that also
//! serves the featured image, and a publisher started on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use wp_publisher::config::PublisherConfig;
use wp_publisher::{HttpServer, Shutdown};

/// Bytes served as the featured image.
pub const IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg-bytes";

/// How the mock site answers each call.
#[derive(Clone)]
pub struct MockBehavior {
    pub image_status: u16,
    pub image_content_type: &'static str,
    pub media_status: u16,
    pub media_body: String,
    pub post_status: u16,
    pub post_body: Value,
    /// Added before the image and media endpoints answer.
    pub delay: Duration,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            image_status: 200,
            image_content_type: "image/jpeg",
            media_status: 201,
            media_body: json!({"id": 42, "source_url": "https://example.com/featured-image.jpg"})
                .to_string(),
            post_status: 201,
            post_body: json!({
                "id": 100,
                "link": "https://example.com/?p=100",
                "slug": "hello-world",
                "author": 1,
            }),
            delay: Duration::ZERO,
        }
    }
}

/// A file received by the media endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

/// What the mock site saw.
#[derive(Default)]
pub struct Recorded {
    pub image_calls: AtomicU32,
    pub media_calls: AtomicU32,
    pub post_calls: AtomicU32,
    pub api_keys: Mutex<Vec<String>>,
    pub media_accept: Mutex<Option<String>>,
    pub upload: Mutex<Option<ReceivedUpload>>,
    pub post: Mutex<Option<Value>>,
}

struct MockState {
    behavior: MockBehavior,
    recorded: Arc<Recorded>,
}

/// Handle to a running mock site.
pub struct MockSite {
    pub addr: SocketAddr,
    pub recorded: Arc<Recorded>,
}

impl MockSite {
    /// Site URL as a caller would type it (with trailing slash).
    pub fn site_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn image_url(&self) -> String {
        format!("http://{}/image.jpg", self.addr)
    }

    pub fn media_calls(&self) -> u32 {
        self.recorded.media_calls.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> u32 {
        self.recorded.post_calls.load(Ordering::SeqCst)
    }

    pub fn last_post(&self) -> Option<Value> {
        self.recorded.post.lock().unwrap().clone()
    }

    pub fn last_upload(&self) -> Option<ReceivedUpload> {
        self.recorded.upload.lock().unwrap().clone()
    }

    pub fn api_keys(&self) -> Vec<String> {
        self.recorded.api_keys.lock().unwrap().clone()
    }
}

/// Bind a router on an ephemeral port and serve it in the background.
pub async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a mock WordPress site with the given behavior.
pub async fn start_mock_site(behavior: MockBehavior) -> MockSite {
    let recorded = Arc::new(Recorded::default());
    let state = Arc::new(MockState {
        behavior,
        recorded: recorded.clone(),
    });

    let router = Router::new()
        .route("/image.jpg", get(serve_image))
        .route("/wp-json/wp/v2/media", post(receive_media))
        .route("/wp-json/wp/v2/posts", post(receive_post))
        .with_state(state);

    let addr = spawn_router(router).await;
    MockSite { addr, recorded }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

fn record_key(recorded: &Recorded, headers: &HeaderMap) {
    if let Some(key) = headers.get("iwc-api-key").and_then(|v| v.to_str().ok()) {
        recorded.api_keys.lock().unwrap().push(key.to_string());
    }
}

async fn serve_image(State(state): State<Arc<MockState>>) -> Response {
    state.recorded.image_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.behavior.delay).await;
    (
        status(state.behavior.image_status),
        [(header::CONTENT_TYPE, state.behavior.image_content_type)],
        IMAGE_BYTES,
    )
        .into_response()
}

async fn receive_media(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    state.recorded.media_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.behavior.delay).await;
    record_key(&state.recorded, &headers);
    *state.recorded.media_accept.lock().unwrap() = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    while let Ok(Some(field)) = multipart.next_field().await {
        let upload_field = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();
        *state.recorded.upload.lock().unwrap() = Some(ReceivedUpload {
            field: upload_field,
            file_name,
            content_type,
            size,
        });
    }

    (
        status(state.behavior.media_status),
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::HeaderName::from_static("x-wp-mock"), "media"),
        ],
        state.behavior.media_body.clone(),
    )
        .into_response()
}

async fn receive_post(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.recorded.post_calls.fetch_add(1, Ordering::SeqCst);
    record_key(&state.recorded, &headers);
    *state.recorded.post.lock().unwrap() = Some(body);

    (
        status(state.behavior.post_status),
        [(header::HeaderName::from_static("x-wp-mock"), "posts")],
        Json(state.behavior.post_body.clone()),
    )
        .into_response()
}

/// A publisher running on an ephemeral port.
pub struct TestPublisher {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub options_dir: tempfile::TempDir,
}

impl TestPublisher {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn options_path(&self) -> std::path::PathBuf {
        self.options_dir.path().join("site-options.json")
    }
}

/// Start a publisher. `configure` may adjust the defaults; the options
/// path is always redirected to a temp directory.
pub async fn start_publisher(configure: impl FnOnce(&mut PublisherConfig)) -> TestPublisher {
    let options_dir = tempfile::tempdir().unwrap();

    let mut config = PublisherConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.upstream_secs = 5;
    config.timeouts.request_secs = 10;
    config.upstream.no_proxy = true;
    configure(&mut config);
    config.keys.options_path = options_dir
        .path()
        .join("site-options.json")
        .to_string_lossy()
        .into_owned();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Listener is already bound; give the accept loop a moment anyway.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestPublisher {
        addr,
        shutdown,
        options_dir,
    }
}

/// Plain HTTP client without connection pooling or proxies.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A complete, valid JSON publish body targeting `site`.
pub fn valid_payload(site: &MockSite) -> Value {
    json!({
        "wordpress_api_key": "test_key",
        "wordpressurl": site.site_url(),
        "featuredimageurl": site.image_url(),
        "post_content": "<h1>Test</h1>",
    })
}
