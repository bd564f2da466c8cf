//! otelwasm guest bridge
//!
//! Guest-side runtime for telemetry pipeline extensions compiled to WASM.
//! A module registers exactly one extension; the host then drives it
//! through a small set of exports. Receivers run until the host raises its
//! shutdown flag, which the guest discovers by polling because the sandbox
//! cannot interrupt it.

pub mod abi;
pub mod bridge;
pub mod capability;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod module;
pub mod poller;
pub mod registry;
pub mod signal;
pub mod wire;

pub use bridge::{Bridge, ReceiverRun};
pub use capability::{
    AnyReceiver, Extension, LogsProcessor, LogsReceiver, MetricsProcessor, MetricsReceiver,
    ProcessOutput, Status, StatusCode, TracesProcessor, TracesReceiver,
};
pub use config::BridgeConfig;
pub use error::GuestError;
pub use host::{HostEnv, LocalHost};
pub use module::GuestModule;
pub use poller::{PollerExit, PollerState, ShutdownPoller};
pub use registry::PluginRegistry;
pub use signal::{Capabilities, Capability, Signal};
pub use wire::ProcessResponse;

#[cfg(target_arch = "wasm32")]
pub use host::WasmHost;

// Re-exported so extensions share the bridge's versions.
pub use async_trait::async_trait;
pub use opentelemetry_proto as proto;
pub use tokio_util::sync::CancellationToken;
