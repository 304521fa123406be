//! Webhook processing endpoint.
//!
//! Accepts an envelope, acknowledges immediately, then processes the payload
//! and POSTs the result to the caller-supplied callback URL from a
//! background task. The task is cancelable on shutdown; processor failures
//! become best-effort error callbacks instead of dropped requests.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::client::types::{CallbackBody, Envelope};
use crate::http::server::AppState;
use crate::observability::metrics;

/// `POST /webhook` handler. Never blocks the caller on processing.
pub async fn accept_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let envelope: Envelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed webhook body");
            return (StatusCode::BAD_REQUEST, "invalid JSON body").into_response();
        }
    };

    if Url::parse(&envelope.url).is_err() {
        tracing::debug!(url = %envelope.url, "Webhook with unusable callback url");
        return (StatusCode::BAD_REQUEST, "invalid callback url").into_response();
    }

    // Generate an ID when the sender omitted one so the callback always
    // correlates; echo it in the ack for observability.
    let request_id = match envelope.request_id.clone().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => Uuid::new_v4().to_string(),
    };

    spawn_processing(state, envelope, request_id.clone());

    (
        StatusCode::OK,
        Json(json!({"status": "accepted", "request_id": request_id})),
    )
        .into_response()
}

/// Spawn the processing/delivery task, tied to the shutdown signal so it is
/// not orphaned past server shutdown.
fn spawn_processing(state: AppState, envelope: Envelope, request_id: String) {
    let mut shutdown_rx = state.shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::debug!(request_id = %request_id, "Webhook processing cancelled by shutdown");
                metrics::record_webhook("cancelled");
            }
            _ = process_and_deliver(state, envelope, request_id.clone()) => {}
        }
    });
}

async fn process_and_deliver(state: AppState, envelope: Envelope, request_id: String) {
    let callback = match &state.processor {
        // No processor configured: identity, payload echoed unchanged.
        None => CallbackBody {
            request_id: request_id.clone(),
            payload: envelope.payload.clone(),
            error: None,
            failed_stage: None,
            secure_key: None,
        },
        Some(processor) => match processor.process(&envelope.payload, &request_id) {
            Ok(payload) => CallbackBody {
                request_id: request_id.clone(),
                payload,
                error: None,
                failed_stage: None,
                secure_key: None,
            },
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    processor = processor.name(),
                    error = %e,
                    "Webhook processing failed"
                );
                metrics::record_webhook("process_error");
                CallbackBody {
                    request_id: request_id.clone(),
                    payload: Value::Null,
                    error: Some(e.to_string()),
                    failed_stage: e.failed_stage(),
                    secure_key: None,
                }
            }
        },
    };

    let client = state.transport.select(envelope.secure_key.as_deref());
    match client.post(&envelope.url).json(&callback).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(
                request_id = %request_id,
                url = %envelope.url,
                "Webhook result delivered"
            );
            metrics::record_webhook("delivered");
        }
        Ok(response) => {
            tracing::warn!(
                request_id = %request_id,
                url = %envelope.url,
                status = %response.status(),
                "Callback URL rejected webhook result"
            );
            metrics::record_webhook("delivery_error");
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                url = %envelope.url,
                error = %e,
                "Webhook result delivery failed"
            );
            metrics::record_webhook("delivery_error");
        }
    }
}
