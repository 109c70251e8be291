//! Response rendering.
//!
//! Every publish response is `application/json` with a `success` flag.
//! Failures carry the status chosen by [`PublishError::status`].

use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::publish::{PublishError, PublishOutcome};

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}

impl IntoResponse for PublishOutcome {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
