use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::keys::{ApiKeyManager, KeyStoreError};
use crate::publish::PublishError;

#[derive(Serialize)]
pub struct SystemStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub api_key_set: bool,
}

#[derive(Serialize)]
pub struct ApiKeyView {
    pub api_key: Option<String>,
}

/// Key store failure surfaced as a JSON 500.
pub struct AdminError(KeyStoreError);

impl From<KeyStoreError> for AdminError {
    fn from(err: KeyStoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "API key store failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": self.0.to_string()})),
        )
            .into_response()
    }
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<SystemStatus>, AdminError> {
    Ok(Json(SystemStatus {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        api_key_set: state.keys.current()?.is_some(),
    }))
}

pub async fn get_api_key(State(state): State<AppState>) -> Result<Json<ApiKeyView>, AdminError> {
    Ok(Json(ApiKeyView {
        api_key: state.keys.current()?,
    }))
}

pub async fn regenerate_api_key(
    State(state): State<AppState>,
) -> Result<Json<ApiKeyView>, AdminError> {
    let key = state.keys.run_blocking(ApiKeyManager::regenerate).await?;
    Ok(Json(ApiKeyView { api_key: Some(key) }))
}

/// Uninstall: drop the key option.
pub async fn delete_api_key(State(state): State<AppState>) -> Result<StatusCode, AdminError> {
    state.keys.run_blocking(ApiKeyManager::uninstall).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn method_not_allowed() -> PublishError {
    PublishError::MethodNotAllowed
}
