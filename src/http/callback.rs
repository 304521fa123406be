//! Callback delivery endpoint.
//!
//! Pure plumbing between the wire and the correlation registry: no payload
//! transformation happens here. Exactly one waiting round trip unblocks per
//! successful delivery.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::client::types::CallbackBody;
use crate::correlation::DeliverOutcome;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `POST /roundtrip` handler.
///
/// The body is parsed manually so any malformed JSON is a 400; axum's
/// method routing already rejects non-POST with 405.
pub async fn deliver_callback(State(state): State<AppState>, body: Bytes) -> Response {
    let callback: CallbackBody = match serde_json::from_slice(&body) {
        Ok(callback) => callback,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed callback body");
            metrics::record_callback("bad_request");
            return (StatusCode::BAD_REQUEST, "invalid JSON body").into_response();
        }
    };

    let request_id = callback.request_id.clone();
    match state.registry.deliver(&request_id, callback) {
        DeliverOutcome::Delivered => {
            tracing::debug!(request_id = %request_id, "Callback delivered");
            metrics::record_callback("delivered");
            (StatusCode::OK, "delivered").into_response()
        }
        DeliverOutcome::NotFound => {
            tracing::debug!(request_id = %request_id, "Callback for unknown request id");
            metrics::record_callback("not_found");
            (StatusCode::NOT_FOUND, "unknown request id").into_response()
        }
        DeliverOutcome::Gone => {
            tracing::debug!(request_id = %request_id, "Callback for already-resolved request");
            metrics::record_callback("gone");
            (StatusCode::GONE, "request already resolved").into_response()
        }
    }
}
