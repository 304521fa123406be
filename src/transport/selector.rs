//! Transport selection for outbound POSTs.
//!
//! Every outbound request goes through [`TransportSelector::select`]: plain
//! HTTP by default, or a secure-overlay client when the caller supplied a
//! credential. Overlay setup failure degrades to the plain client instead of
//! failing the call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{Client, Proxy};
use thiserror::Error;

use crate::observability::metrics;

/// Errors from establishing a secure overlay client.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("empty overlay credential")]
    EmptyCredential,

    #[error("credential is not usable as an authorization header")]
    BadCredential,

    #[error("overlay client construction failed: {0}")]
    Build(#[from] reqwest::Error),
}

/// External collaborator capability: turn an overlay credential into an
/// HTTP-capable client bound to the overlay session.
pub trait SecureTransport: Send + Sync {
    fn establish(&self, key: &str) -> Result<Client, TransportError>;
}

/// Reference overlay implementation: route through a configured proxy,
/// presenting the credential as proxy authorization.
pub struct ProxySecureTransport {
    proxy_url: String,
    send_timeout: Duration,
}

impl ProxySecureTransport {
    pub fn new(proxy_url: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            send_timeout,
        }
    }
}

impl SecureTransport for ProxySecureTransport {
    fn establish(&self, key: &str) -> Result<Client, TransportError> {
        if key.is_empty() {
            return Err(TransportError::EmptyCredential);
        }
        let auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| TransportError::BadCredential)?;
        let proxy = Proxy::all(&self.proxy_url)?.custom_http_auth(auth);
        let client = Client::builder()
            .proxy(proxy)
            .timeout(self.send_timeout)
            .build()?;
        Ok(client)
    }
}

/// Picks the client for one outbound POST. Stateless: re-invoked per send.
pub struct TransportSelector {
    default_client: Client,
    secure: Option<Arc<dyn SecureTransport>>,
}

impl TransportSelector {
    pub fn new(
        send_timeout: Duration,
        secure: Option<Arc<dyn SecureTransport>>,
    ) -> Result<Self, TransportError> {
        let default_client = Client::builder().timeout(send_timeout).build()?;
        Ok(Self {
            default_client,
            secure,
        })
    }

    /// Return a client appropriate for `secure_key`.
    ///
    /// Overlay failures are logged and counted, never surfaced: the caller
    /// gets the plain client and the send proceeds.
    pub fn select(&self, secure_key: Option<&str>) -> Client {
        let key = match secure_key {
            Some(key) if !key.is_empty() => key,
            _ => return self.default_client.clone(),
        };

        let provider = match &self.secure {
            Some(provider) => provider,
            None => {
                tracing::debug!("Secure transport requested but no provider configured; using plain client");
                return self.default_client.clone();
            }
        };

        match provider.establish(key) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Secure transport unavailable; falling back to plain client");
                metrics::record_transport_fallback();
                self.default_client.clone()
            }
        }
    }
}
