//! Wire types for the round-trip protocol.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound message POSTed to the remote peer, and the body the local
/// `/webhook` endpoint accepts. `url` is the absolute callback URL the
/// processed result must be POSTed back to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub url: String,

    #[serde(default)]
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Credential for the secure overlay transport, carried alongside the
    /// payload so the peer can choose how to deliver its reply.
    #[serde(
        rename = "tailnet_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secure_key: Option<String>,
}

/// Body of a callback POST to `/roundtrip`.
///
/// A peer that failed to process the payload reports the failure here
/// instead of dropping the request: `error` is set and, for chain
/// processors, `failed_stage` names the stage that short-circuited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackBody {
    pub request_id: String,

    #[serde(default)]
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<usize>,

    #[serde(
        rename = "tailnet_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secure_key: Option<String>,
}

/// Outcome of one round trip, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RoundTripResult {
    /// The correlation key that was used, echoed back.
    pub request_id: String,

    pub success: bool,

    /// Payload delivered by the remote peer; `Value::Null` on failure.
    pub payload: Value,

    /// Human-readable failure reason; `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True only when the peer acknowledged the send but never called back
    /// in time. Distinct from "responded with an error".
    pub timed_out: bool,
}

impl RoundTripResult {
    pub(crate) fn failed(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            payload: Value::Null,
            error: Some(error.into()),
            timed_out: false,
        }
    }

    pub(crate) fn timeout(request_id: impl Into<String>, waited: Duration) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            payload: Value::Null,
            error: Some(format!(
                "timeout waiting for response after {:.1}s",
                waited.as_secs_f64()
            )),
            timed_out: true,
        }
    }

    /// Resolve from a delivered callback. A callback carrying `error` counts
    /// as a failed round trip even though the peer did respond.
    pub(crate) fn from_callback(request_id: impl Into<String>, body: CallbackBody) -> Self {
        let success = body.error.is_none();
        Self {
            request_id: request_id.into(),
            success,
            payload: body.payload,
            error: body.error,
            timed_out: false,
        }
    }
}

/// Per-call knobs for [`RoundTripClient::round_trip_post`].
///
/// `request_id` is the explicit correlation key: reusing a caller-supplied
/// ID keys idempotent retries, while `None` (or empty) generates a fresh
/// unique ID.
///
/// [`RoundTripClient::round_trip_post`]: crate::client::RoundTripClient::round_trip_post
#[derive(Debug, Clone, Default)]
pub struct RoundTripOptions {
    pub request_id: Option<String>,
    pub secure_key: Option<String>,
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_field_names() {
        let envelope = Envelope {
            url: "http://127.0.0.1:8484/roundtrip".into(),
            payload: json!({"a": 1}),
            request_id: Some("r1".into()),
            secure_key: Some("ts-key".into()),
        };
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["request_id"], "r1");
        // The secure credential travels under its wire name.
        assert_eq!(wire["tailnet_key"], "ts-key");
        assert!(wire.get("secure_key").is_none());
    }

    #[test]
    fn test_envelope_optional_fields_absent() {
        let envelope = Envelope {
            url: "http://x/".into(),
            payload: json!(1),
            request_id: None,
            secure_key: None,
        };
        let wire = serde_json::to_value(&envelope).unwrap();
        assert!(wire.get("request_id").is_none());
        assert!(wire.get("tailnet_key").is_none());
    }

    #[test]
    fn test_callback_with_error_resolves_failed_not_timed_out() {
        let result = RoundTripResult::from_callback(
            "r1",
            CallbackBody {
                request_id: "r1".into(),
                payload: Value::Null,
                error: Some("stage 0 (validate) failed".into()),
                failed_stage: Some(0),
                secure_key: None,
            },
        );
        assert!(!result.success);
        assert!(!result.timed_out);
        assert!(result.error.unwrap().contains("stage 0"));
    }

    #[test]
    fn test_timeout_result_is_flagged() {
        let result = RoundTripResult::timeout("r1", Duration::from_secs(5));
        assert!(!result.success);
        assert!(result.timed_out);
    }
}
