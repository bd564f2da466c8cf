//! Entrypoint bridge. Turns host export calls into calls on the extension.
//!
//! A receiver export blocks the host's call for as long as the receiver
//! runs. The receiver and the shutdown poller share one current-thread
//! runtime and one cancellation token created for that call; both are
//! dropped when the call returns.

use std::time::{Duration, Instant};

use opentelemetry_proto::tonic::logs::v1::LogsData;
use opentelemetry_proto::tonic::metrics::v1::MetricsData;
use opentelemetry_proto::tonic::trace::v1::TracesData;
use prost::Message;
use tokio_util::sync::CancellationToken;

use crate::capability::{AnyReceiver, Extension, ProcessOutput, Status};
use crate::config::BridgeConfig;
use crate::error::GuestError;
use crate::host::HostEnv;
use crate::poller::{PollerExit, ShutdownPoller};
use crate::registry::PluginRegistry;
use crate::signal::{Capabilities, Capability, Signal};
use crate::wire::{decode_payload, ProcessResponse};

/// Summary of one receiver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverRun {
    pub signal: Signal,
    pub exit: PollerExit,
    pub elapsed: Duration,
}

pub struct Bridge<'a, H: HostEnv + ?Sized> {
    registry: &'a PluginRegistry,
    host: &'a H,
    config: &'a BridgeConfig,
}

impl<'a, H: HostEnv + ?Sized> Bridge<'a, H> {
    pub fn new(registry: &'a PluginRegistry, host: &'a H, config: &'a BridgeConfig) -> Self {
        Self {
            registry,
            host,
            config,
        }
    }

    /// Capabilities of the registered extension.
    pub fn supported(&self) -> Result<Capabilities, GuestError> {
        Ok(self.registry.active()?.capabilities())
    }

    // ── Receivers ────────────────────────────────────────────────────

    /// Run the registered receiver for `signal` until it returns.
    ///
    /// Blocks the calling thread, so it must not be called from inside a
    /// tokio runtime; async callers use [`Bridge::drive`]. Contract failures
    /// (nothing registered, receiver not implemented, invalid interval) are
    /// reported before any runtime is built.
    pub fn start_receiver(&self, signal: Signal) -> Result<ReceiverRun, GuestError> {
        self.config.validate()?;
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(GuestError::NestedRuntime);
        }
        let extension = self.registry.active()?;
        let receiver = extension
            .receiver(signal)
            .ok_or_else(|| unbound(extension, Capability::receiver(signal)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        tracing::info!(extension = %extension.name(), signal = %signal, "receiver starting");

        let started = Instant::now();
        let exit = runtime.block_on(self.drive(receiver, CancellationToken::new()));
        let elapsed = started.elapsed();

        tracing::info!(
            extension = %extension.name(),
            signal = %signal,
            exit = ?exit,
            elapsed_ms = elapsed.as_millis() as u64,
            "receiver returned"
        );

        Ok(ReceiverRun {
            signal,
            exit,
            elapsed,
        })
    }

    /// Run `receiver` and the shutdown poller side by side on `token`.
    ///
    /// The poller is halted once the receiver returns, so it never outlives
    /// the invocation.
    pub async fn drive(&self, receiver: AnyReceiver<'_>, token: CancellationToken) -> PollerExit {
        let halt = token.child_token();
        let mut poller = ShutdownPoller::new(self.host, self.config.poll_interval);

        let (exit, ()) = tokio::join!(poller.run(token.clone(), halt.clone()), async {
            receiver.start(token.clone()).await;
            halt.cancel();
        });

        exit
    }

    // ── Processors ───────────────────────────────────────────────────

    /// Run the registered processor for `signal` over an encoded batch.
    ///
    /// An undecodable payload yields a response with an `InvalidData`
    /// status; the processor's own status is forwarded unchanged.
    pub fn process(&self, signal: Signal, payload: &[u8]) -> Result<ProcessResponse, GuestError> {
        let extension = self.registry.active()?;
        let response = match signal {
            Signal::Traces => {
                let processor = extension
                    .as_traces_processor()
                    .ok_or_else(|| unbound(extension, Capability::processor(signal)))?;
                run_processor::<TracesData>(payload, |batch| processor.process_traces(batch))
            }
            Signal::Metrics => {
                let processor = extension
                    .as_metrics_processor()
                    .ok_or_else(|| unbound(extension, Capability::processor(signal)))?;
                run_processor::<MetricsData>(payload, |batch| processor.process_metrics(batch))
            }
            Signal::Logs => {
                let processor = extension
                    .as_logs_processor()
                    .ok_or_else(|| unbound(extension, Capability::processor(signal)))?;
                run_processor::<LogsData>(payload, |batch| processor.process_logs(batch))
            }
        };

        if let Some(status) = response.status() {
            tracing::warn!(
                extension = %extension.name(),
                signal = %signal,
                status = %status,
                "processor reported failure"
            );
        }

        Ok(response)
    }
}

fn run_processor<T>(payload: &[u8], process: impl FnOnce(&T) -> ProcessOutput<T>) -> ProcessResponse
where
    T: Message + Default,
{
    match decode_payload::<T>(payload) {
        Ok(batch) => ProcessResponse::from_output(&process(&batch)),
        Err(e) => ProcessResponse::failed(&Status::invalid_data(e.to_string())),
    }
}

fn unbound(extension: &dyn Extension, capability: Capability) -> GuestError {
    tracing::error!(
        extension = %extension.name(),
        capability = %capability,
        "export invoked for a capability the extension does not implement"
    );
    GuestError::UnboundCapability {
        extension: extension.name().to_string(),
        capability,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
