//! Configuration validation.
//!
//! Semantic validation on top of serde's syntactic checks. Runs before a
//! config is accepted into the system and returns all errors, not just the
//! first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;
use crate::processor::KNOWN_PROCESSORS;

/// A single semantic problem found in a [`RelayConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a valid socket address")]
    BindAddress(String),

    #[error("listener.public_url `{0}` is not a valid URL")]
    PublicUrl(String),

    #[error("destination.url `{0}` is not a valid URL")]
    DestinationUrl(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("webhook.processors contains unknown processor `{0}`")]
    UnknownProcessor(String),

    #[error("webhook.processors includes `validate` but webhook.required_fields is empty")]
    ValidateWithoutFields,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(url) = &config.listener.public_url {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::PublicUrl(url.clone()));
        }
    }

    if let Some(url) = &config.destination.url {
        if Url::parse(url).is_err() {
            errors.push(ValidationError::DestinationUrl(url.clone()));
        }
    }

    if config.timeouts.send_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("send_secs"));
    }
    if config.timeouts.response_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("response_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    for name in &config.webhook.processors {
        if !KNOWN_PROCESSORS.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownProcessor(name.clone()));
        }
    }
    if config.webhook.processors.iter().any(|p| p == "validate")
        && config.webhook.required_fields.is_empty()
    {
        errors.push(ValidationError::ValidateWithoutFields);
    }

    // transport.proxy_url is deliberately not validated here: a bad overlay
    // URL is a runtime establish failure the transport selector falls back
    // from, not a reason to refuse to start.

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
