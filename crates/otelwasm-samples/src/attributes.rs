//! Trace processor that stamps one attribute onto every span.

use serde::Deserialize;

use otelwasm_guest::proto::tonic::common::v1::{any_value, AnyValue, KeyValue};
use otelwasm_guest::proto::tonic::trace::v1::TracesData;
use otelwasm_guest::{ProcessOutput, Status, TracesProcessor};

pub const DEFAULT_KEY: &str = "otelwasm.processed";
pub const DEFAULT_VALUE: &str = "true";

/// `{"key": "...", "value": "..."}` supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeConfig {
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_value")]
    pub value: String,
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_value() -> String {
    DEFAULT_VALUE.to_string()
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            key: default_key(),
            value: default_value(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddAttributeProcessor {
    config: AttributeConfig,
}

impl AddAttributeProcessor {
    pub fn new(config: AttributeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttributeConfig {
        &self.config
    }

    fn attribute(&self) -> KeyValue {
        KeyValue {
            key: self.config.key.clone(),
            value: Some(AnyValue {
                value: Some(any_value::Value::StringValue(self.config.value.clone())),
            }),
        }
    }
}

impl TracesProcessor for AddAttributeProcessor {
    fn process_traces(&self, traces: &TracesData) -> ProcessOutput<TracesData> {
        if self.config.key.is_empty() {
            return ProcessOutput::with_status(
                traces.clone(),
                Status::invalid_data("attribute key must not be empty"),
            );
        }

        let mut out = traces.clone();
        let mut touched = 0usize;
        for span in out
            .resource_spans
            .iter_mut()
            .flat_map(|rs| rs.scope_spans.iter_mut())
            .flat_map(|ss| ss.spans.iter_mut())
        {
            // Upsert: an existing value for the key is replaced.
            span.attributes.retain(|kv| kv.key != self.config.key);
            span.attributes.push(self.attribute());
            touched += 1;
        }

        tracing::debug!(key = %self.config.key, spans = touched, "attribute added");
        ProcessOutput::ok(out)
    }
}
