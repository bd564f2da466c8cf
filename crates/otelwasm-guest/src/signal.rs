//! Telemetry signals and the capability set an extension advertises.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GuestError;

/// One telemetry category.
///
/// The discriminant is the value the host passes to `process_telemetry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum Signal {
    Traces = 0,
    Metrics = 1,
    Logs = 2,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Traces, Signal::Metrics, Signal::Logs];

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Traces => "traces",
            Signal::Metrics => "metrics",
            Signal::Logs => "logs",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for Signal {
    type Error = GuestError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Signal::Traces),
            1 => Ok(Signal::Metrics),
            2 => Ok(Signal::Logs),
            other => Err(GuestError::UnknownSignal(other)),
        }
    }
}

// ─── Capabilities ───────────────────────────────────────────────────────

/// A single operation contract an extension may satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    TracesProcessor,
    MetricsProcessor,
    LogsProcessor,
    TracesReceiver,
    MetricsReceiver,
    LogsReceiver,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::TracesProcessor,
        Capability::MetricsProcessor,
        Capability::LogsProcessor,
        Capability::TracesReceiver,
        Capability::MetricsReceiver,
        Capability::LogsReceiver,
    ];

    pub fn processor(signal: Signal) -> Self {
        match signal {
            Signal::Traces => Capability::TracesProcessor,
            Signal::Metrics => Capability::MetricsProcessor,
            Signal::Logs => Capability::LogsProcessor,
        }
    }

    pub fn receiver(signal: Signal) -> Self {
        match signal {
            Signal::Traces => Capability::TracesReceiver,
            Signal::Metrics => Capability::MetricsReceiver,
            Signal::Logs => Capability::LogsReceiver,
        }
    }

    /// Bit reported to the host by `get_supported_telemetry`.
    pub const fn bit(self) -> u32 {
        match self {
            Capability::TracesProcessor => 1 << 0,
            Capability::MetricsProcessor => 1 << 1,
            Capability::LogsProcessor => 1 << 2,
            Capability::TracesReceiver => 1 << 3,
            Capability::MetricsReceiver => 1 << 4,
            Capability::LogsReceiver => 1 << 5,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Capability::TracesProcessor
            | Capability::MetricsProcessor
            | Capability::LogsProcessor => "processor",
            _ => "receiver",
        };
        let signal = match self {
            Capability::TracesProcessor | Capability::TracesReceiver => Signal::Traces,
            Capability::MetricsProcessor | Capability::MetricsReceiver => Signal::Metrics,
            Capability::LogsProcessor | Capability::LogsReceiver => Signal::Logs,
        };
        write!(f, "{signal} {kind}")
    }
}

/// Set of capabilities, stored as a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Capabilities::empty(), Capabilities::with)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}
