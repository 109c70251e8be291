//! Admin API: the service-side counterpart of the plugin's settings panel.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Routes under `/admin`, guarded by the admin bearer token. A wrong method
/// on a known path answers with the same JSON 405 as the publish endpoint.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/admin/status",
            get(get_status).fallback(method_not_allowed),
        )
        .route(
            "/admin/api-key",
            get(get_api_key)
                .delete(delete_api_key)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/api-key/regenerate",
            post(regenerate_api_key).fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
