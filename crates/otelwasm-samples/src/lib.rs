//! Sample otelwasm extension.
//!
//! Adds a configurable attribute to every span passing through the traces
//! processor, and offers idle receivers for all three signals.

pub mod attributes;
pub mod receiver;

use otelwasm_guest::config::plugin_config;
use otelwasm_guest::{
    Extension, GuestError, HostEnv, LogsReceiver, MetricsReceiver, TracesProcessor,
    TracesReceiver,
};

pub use attributes::{AddAttributeProcessor, AttributeConfig};
pub use receiver::NoopReceiver;

pub struct SampleExtension {
    processor: AddAttributeProcessor,
    receiver: NoopReceiver,
}

impl SampleExtension {
    pub fn new(config: AttributeConfig) -> Self {
        Self {
            processor: AddAttributeProcessor::new(config),
            receiver: NoopReceiver,
        }
    }

    /// Build from the host's plugin configuration, falling back to defaults
    /// when the host supplies none.
    pub fn from_host(host: &impl HostEnv) -> Result<Self, GuestError> {
        let config = plugin_config::<AttributeConfig>(host)?.unwrap_or_default();
        tracing::info!(key = %config.key, value = %config.value, "sample extension configured");
        Ok(Self::new(config))
    }

    pub fn processor(&self) -> &AddAttributeProcessor {
        &self.processor
    }
}

impl Extension for SampleExtension {
    fn name(&self) -> &str {
        "otelwasm-samples"
    }

    fn as_traces_processor(&self) -> Option<&dyn TracesProcessor> {
        Some(&self.processor)
    }

    fn as_traces_receiver(&self) -> Option<&dyn TracesReceiver> {
        Some(&self.receiver)
    }

    fn as_metrics_receiver(&self) -> Option<&dyn MetricsReceiver> {
        Some(&self.receiver)
    }

    fn as_logs_receiver(&self) -> Option<&dyn LogsReceiver> {
        Some(&self.receiver)
    }
}

otelwasm_guest::export_plugin!(SampleExtension::from_host);
