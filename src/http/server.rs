//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the publish and admin handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Graceful shutdown on signal or trigger

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::admin::setup_admin_router;
use crate::config::PublisherConfig;
use crate::http::publish::publish_handler;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::keys::{ApiKeyManager, OptionStore};
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::StartupError;
use crate::publish::Publisher;
use crate::wordpress::WordPressClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub publisher: Publisher,
    pub keys: ApiKeyManager,
    pub config: Arc<PublisherConfig>,
}

/// HTTP server for the publisher.
pub struct HttpServer {
    router: Router,
    config: Arc<PublisherConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: PublisherConfig) -> Result<Self, StartupError> {
        let client = WordPressClient::new(&config)?;

        let keys = ApiKeyManager::new(OptionStore::open(&config.keys.options_path)?);
        if config.keys.generate_on_start {
            keys.ensure()?;
        }

        let config = Arc::new(config);
        let state = AppState {
            publisher: Publisher::new(client),
            keys,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request deadline is enforced by the publish handler so that a
    /// timeout still answers with a JSON envelope.
    fn build_router(config: &PublisherConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", any(publish_handler))
            .route("/{*path}", any(publish_handler));

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request.headers().request_id(),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
            .with_state(state)
    }

    /// Run the server until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin_enabled = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }
}
