//! Publish endpoint handler.

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method};
use axum::response::{IntoResponse, Response};

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::publish::{parse_body, PublishError, PublishOutcome, PublishRequest};

/// Accepts a publish request on any path. Only `POST` is allowed.
pub async fn publish_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let request_id = headers.request_id().to_string();

    let deadline = Duration::from_secs(state.config.timeouts.request_secs);
    let result = tokio::time::timeout(deadline, handle(&state, &method, &headers, body))
        .await
        .unwrap_or(Err(PublishError::TimedOut(deadline)));

    match result {
        Ok(outcome) => {
            metrics::record_request("success", 200, start_time);
            outcome.into_response()
        }
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, status = %status, error = %err, "Publish failed");
            } else {
                tracing::warn!(request_id = %request_id, status = %status, error = %err, "Publish rejected");
            }
            metrics::record_request(err.kind(), status.as_u16(), start_time);
            err.into_response()
        }
    }
}

async fn handle(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<PublishOutcome, PublishError> {
    if *method != Method::POST {
        return Err(PublishError::MethodNotAllowed);
    }

    tracing::debug!(
        content_type = header_str(headers, header::CONTENT_TYPE),
        user_agent = header_str(headers, header::USER_AGENT),
        "Publish request received"
    );

    let body = body.map_err(|rejection| PublishError::UnreadableBody {
        status: rejection.status(),
        details: rejection.body_text(),
    })?;

    let params = parse_body(&body);
    let request = PublishRequest::from_params(&params)?;
    tracing::debug!(request = ?request, "Parameters validated");

    state.publisher.publish(&request).await
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
