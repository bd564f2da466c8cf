//! Capability contracts an extension can implement.
//!
//! Processors transform one host-delivered batch synchronously and hand back
//! an independent batch. Receivers run until their cancellation token fires,
//! feeding the pipeline by side effect.

use std::fmt;

use async_trait::async_trait;
use opentelemetry_proto::tonic::logs::v1::LogsData;
use opentelemetry_proto::tonic::metrics::v1::MetricsData;
use opentelemetry_proto::tonic::trace::v1::TracesData;
use tokio_util::sync::CancellationToken;

use crate::signal::{Capabilities, Capability, Signal};

// ─── Status ─────────────────────────────────────────────────────────────

/// Error code carried by a [`Status`]. Zero is reserved on the wire for
/// "no status".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Error = 1,
    InvalidData = 2,
    Unavailable = 3,
}

impl StatusCode {
    pub fn from_wire(code: i32) -> Option<Self> {
        match code {
            1 => Some(StatusCode::Error),
            2 => Some(StatusCode::InvalidData),
            3 => Some(StatusCode::Unavailable),
            _ => None,
        }
    }
}

/// Failure reported by a processing call. Absence means success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Error,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::InvalidData,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::Unavailable,
            message: message.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Result of a processing call: the new batch plus an optional status.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput<T> {
    pub data: T,
    pub status: Option<Status>,
}

impl<T> ProcessOutput<T> {
    pub fn ok(data: T) -> Self {
        Self { data, status: None }
    }

    pub fn with_status(data: T, status: Status) -> Self {
        Self {
            data,
            status: Some(status),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_none()
    }
}

// ─── Processors ─────────────────────────────────────────────────────────

pub trait TracesProcessor: Send + Sync {
    fn process_traces(&self, traces: &TracesData) -> ProcessOutput<TracesData>;
}

pub trait MetricsProcessor: Send + Sync {
    fn process_metrics(&self, metrics: &MetricsData) -> ProcessOutput<MetricsData>;
}

pub trait LogsProcessor: Send + Sync {
    fn process_logs(&self, logs: &LogsData) -> ProcessOutput<LogsData>;
}

// ─── Receivers ──────────────────────────────────────────────────────────

/// Runs until `token` is cancelled, then returns promptly.
#[async_trait]
pub trait TracesReceiver: Send + Sync {
    async fn start_traces(&self, token: CancellationToken);
}

#[async_trait]
pub trait MetricsReceiver: Send + Sync {
    async fn start_metrics(&self, token: CancellationToken);
}

#[async_trait]
pub trait LogsReceiver: Send + Sync {
    async fn start_logs(&self, token: CancellationToken);
}

/// A receiver of any signal, resolved from an [`Extension`].
#[derive(Clone, Copy)]
pub enum AnyReceiver<'a> {
    Traces(&'a dyn TracesReceiver),
    Metrics(&'a dyn MetricsReceiver),
    Logs(&'a dyn LogsReceiver),
}

impl AnyReceiver<'_> {
    pub fn signal(&self) -> Signal {
        match self {
            AnyReceiver::Traces(_) => Signal::Traces,
            AnyReceiver::Metrics(_) => Signal::Metrics,
            AnyReceiver::Logs(_) => Signal::Logs,
        }
    }

    pub async fn start(self, token: CancellationToken) {
        match self {
            AnyReceiver::Traces(r) => r.start_traces(token).await,
            AnyReceiver::Metrics(r) => r.start_metrics(token).await,
            AnyReceiver::Logs(r) => r.start_logs(token).await,
        }
    }
}

// ─── Extension ──────────────────────────────────────────────────────────

/// The unit registered into a module instance.
///
/// Implement the capability traits on your type, then opt into each one by
/// overriding the matching `as_*` accessor. An extension that exposes no
/// capability is rejected at registration.
pub trait Extension: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn as_traces_processor(&self) -> Option<&dyn TracesProcessor> {
        None
    }

    fn as_metrics_processor(&self) -> Option<&dyn MetricsProcessor> {
        None
    }

    fn as_logs_processor(&self) -> Option<&dyn LogsProcessor> {
        None
    }

    fn as_traces_receiver(&self) -> Option<&dyn TracesReceiver> {
        None
    }

    fn as_metrics_receiver(&self) -> Option<&dyn MetricsReceiver> {
        None
    }

    fn as_logs_receiver(&self) -> Option<&dyn LogsReceiver> {
        None
    }

    fn receiver(&self, signal: Signal) -> Option<AnyReceiver<'_>> {
        match signal {
            Signal::Traces => self.as_traces_receiver().map(AnyReceiver::Traces),
            Signal::Metrics => self.as_metrics_receiver().map(AnyReceiver::Metrics),
            Signal::Logs => self.as_logs_receiver().map(AnyReceiver::Logs),
        }
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        if self.as_traces_processor().is_some() {
            caps = caps.with(Capability::TracesProcessor);
        }
        if self.as_metrics_processor().is_some() {
            caps = caps.with(Capability::MetricsProcessor);
        }
        if self.as_logs_processor().is_some() {
            caps = caps.with(Capability::LogsProcessor);
        }
        for signal in Signal::ALL {
            if self.receiver(signal).is_some() {
                caps = caps.with(Capability::receiver(signal));
            }
        }
        caps
    }
}
