//! Process configuration for the webhook.
//!
//! Built once at startup from environment variables and then shared
//! read-only (behind an `Arc`) by every admission request.

use std::time::Duration;

use thiserror::Error;

use crate::storage;

/// Default webhook server port
pub const DEFAULT_WEBHOOK_PORT: u16 = 9443;
/// Default health/metrics server port
pub const DEFAULT_HEALTH_PORT: u16 = 8080;
/// Default path to webhook TLS certificate
pub const DEFAULT_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const DEFAULT_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default deadline for the InferenceService reference lookup.
///
/// Must stay below the API server's webhook timeout (10s by default).
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(8);

const ENV_PROTOCOLS: &str = "STORAGE_URI_PROTOCOLS";
const ENV_WEBHOOK_PORT: &str = "WEBHOOK_PORT";
const ENV_HEALTH_PORT: &str = "HEALTH_PORT";
const ENV_CERT_PATH: &str = "WEBHOOK_CERT_PATH";
const ENV_KEY_PATH: &str = "WEBHOOK_KEY_PATH";
const ENV_LOOKUP_TIMEOUT: &str = "REFERENCE_LOOKUP_TIMEOUT_SECS";

/// Errors raised while loading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable webhook configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Accepted storage URI prefixes, in order
    pub storage_uri_protocols: Vec<String>,
    /// Port for the TLS admission endpoint
    pub webhook_port: u16,
    /// Port for probes and metrics
    pub health_port: u16,
    /// TLS certificate (PEM)
    pub cert_path: String,
    /// TLS private key (PEM)
    pub key_path: String,
    /// Deadline for the reference lookup against the API server
    pub lookup_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            storage_uri_protocols: storage::all_protocols(),
            webhook_port: DEFAULT_WEBHOOK_PORT,
            health_port: DEFAULT_HEALTH_PORT,
            cert_path: DEFAULT_CERT_PATH.to_string(),
            key_path: DEFAULT_KEY_PATH.to_string(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PROTOCOLS) {
            config.storage_uri_protocols = parse_protocols(&raw);
        }
        if let Some(raw) = lookup(ENV_WEBHOOK_PORT) {
            config.webhook_port = parse_port(ENV_WEBHOOK_PORT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HEALTH_PORT) {
            config.health_port = parse_port(ENV_HEALTH_PORT, &raw)?;
        }
        if let Some(path) = lookup(ENV_CERT_PATH) {
            config.cert_path = path;
        }
        if let Some(path) = lookup(ENV_KEY_PATH) {
            config.key_path = path;
        }
        if let Some(raw) = lookup(ENV_LOOKUP_TIMEOUT) {
            config.lookup_timeout = parse_timeout(ENV_LOOKUP_TIMEOUT, &raw)?;
        }

        Ok(config)
    }

    /// The allow-list rendered for error messages
    pub fn protocols_display(&self) -> String {
        self.storage_uri_protocols.join(storage::PROTOCOL_SEPARATOR)
    }
}

fn parse_protocols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_port(key: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

fn parse_timeout(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
