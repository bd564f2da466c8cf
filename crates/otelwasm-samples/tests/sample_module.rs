//! The sample extension driven through a module instance, as the host would.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use prost::Message;

use otelwasm_guest::proto::tonic::common::v1::any_value::Value;
use otelwasm_guest::proto::tonic::trace::v1::{ResourceSpans, ScopeSpans, Span, TracesData};
use otelwasm_guest::{
    abi, BridgeConfig, GuestError, GuestModule, LocalHost, PollerExit, ProcessResponse, Signal,
};
use otelwasm_samples::SampleExtension;

fn module(host: LocalHost, interval: Duration) -> Arc<GuestModule<Arc<LocalHost>>> {
    let config = BridgeConfig::default().with_poll_interval(interval);
    let ext = SampleExtension::from_host(&host).unwrap();
    Arc::new(GuestModule::initialize(Arc::new(host), config, ext).unwrap())
}

fn encoded(span_names: &[&str]) -> Vec<u8> {
    TracesData {
        resource_spans: vec![ResourceSpans {
            scope_spans: vec![ScopeSpans {
                spans: span_names
                    .iter()
                    .map(|name| Span {
                        name: name.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        }],
    }
    .encode_to_vec()
}

#[test]
fn process_empty_batch_through_export() {
    let module = module(LocalHost::new(), Duration::from_secs(1));
    let payload = encoded(&[]);

    let bytes = abi::respond(module.as_ref(), Signal::Traces as u32, &payload).unwrap();
    let response = ProcessResponse::decode(bytes.as_slice()).unwrap();

    assert!(response.status().is_none());
    let out: TracesData = response.decode_data().unwrap();
    assert!(out.resource_spans[0].scope_spans[0].spans.is_empty());
}

#[test]
fn process_one_span_with_host_config() {
    let host = LocalHost::new().with_plugin_config(r#"{"key":"tenant","value":"acme"}"#);
    let module = module(host, Duration::from_secs(1));

    let response = module
        .bridge()
        .process(Signal::Traces, &encoded(&["GET /cart"]))
        .unwrap();

    assert!(response.status().is_none());
    let out: TracesData = response.decode_data().unwrap();
    let span = &out.resource_spans[0].scope_spans[0].spans[0];
    assert_eq!(span.attributes.len(), 1);
    assert_eq!(span.attributes[0].key, "tenant");
    let value = span.attributes[0].value.as_ref().and_then(|v| v.value.clone());
    assert_eq!(value, Some(Value::StringValue("acme".into())));
}

#[test]
fn unsupported_processor_signal_is_fatal() {
    let module = module(LocalHost::new(), Duration::from_secs(1));
    let err = abi::respond(module.as_ref(), Signal::Logs as u32, &[]).unwrap_err();
    assert!(matches!(err, GuestError::UnboundCapability { .. }));
}

#[test]
fn supported_telemetry_bits() {
    let module = module(LocalHost::new(), Duration::from_secs(1));
    // traces processor + all three receivers
    assert_eq!(abi::supported(module.as_ref()), 0b11_1001);
}

#[test]
fn noop_receiver_stops_within_bounded_latency() {
    let interval = Duration::from_millis(100);
    let module = module(LocalHost::new(), interval);

    for signal in Signal::ALL {
        module.host().reset();
        let flagger = {
            let module = Arc::clone(&module);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                let raised = Instant::now();
                module.host().request_shutdown();
                raised
            })
        };

        let run = module.bridge().start_receiver(signal).unwrap();
        let returned = Instant::now();
        let raised = flagger.join().unwrap();

        assert_eq!(run.signal, signal);
        assert_eq!(run.exit, PollerExit::ShutdownRequested);
        assert!(
            returned.duration_since(raised) <= interval.mul_f64(1.5),
            "{signal} receiver too slow to stop"
        );
    }
}
