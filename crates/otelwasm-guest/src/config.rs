//! Bridge configuration and extension configuration decoding.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::GuestError;
use crate::host::HostEnv;

/// Default interval between shutdown-flag reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Tunables for the entrypoint bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// How often the shutdown poller reads the host flag (default: 1 s).
    pub poll_interval: Duration,
    /// Filter directive for the guest's log output (default: "info").
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Build config from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            poll_interval: std::env::var("OTELWASM_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            log_filter: std::env::var("OTELWASM_LOG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), GuestError> {
        if self.poll_interval.is_zero() {
            return Err(GuestError::Config(
                "poll interval must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Decode the host-supplied JSON configuration for an extension.
///
/// Returns `Ok(None)` when the host has no configuration for this module.
pub fn plugin_config<T: DeserializeOwned>(host: &impl HostEnv) -> Result<Option<T>, GuestError> {
    match host.plugin_config() {
        Some(bytes) if !bytes.is_empty() => Ok(Some(serde_json::from_slice(&bytes)?)),
        _ => Ok(None),
    }
}
