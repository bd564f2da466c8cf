//! Shutdown poller. Turns the host's shutdown flag into cancellation.
//!
//! The sandbox cannot push an interrupt into the guest, so the poller reads
//! the flag on a fixed interval and cancels the invocation's token once the
//! host asks to stop. It also wakes as soon as the token is cancelled from
//! anywhere else, or when the bridge halts it after the receiver returns.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::host::HostEnv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Running,
    Stopped,
}

/// Why the poller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    /// The host flag was set; the poller cancelled the token.
    ShutdownRequested,
    /// The token was cancelled by someone other than the poller.
    Cancelled,
    /// The bridge halted the poller; the token was left untouched.
    Halted,
}

pub struct ShutdownPoller<'a, H: HostEnv + ?Sized> {
    host: &'a H,
    interval: Duration,
    state: PollerState,
}

impl<'a, H: HostEnv + ?Sized> ShutdownPoller<'a, H> {
    pub fn new(host: &'a H, interval: Duration) -> Self {
        Self {
            host,
            interval,
            state: PollerState::Running,
        }
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Poll until shutdown is requested, `token` is cancelled, or `halt` fires.
    ///
    /// `halt` should be a child of `token` so that direct cancellation wakes
    /// the poller without waiting for the next tick. The flag is read on the
    /// first tick, immediately, and then once per interval.
    pub async fn run(&mut self, token: CancellationToken, halt: CancellationToken) -> PollerExit {
        let exit = self.poll(&token, &halt).await;
        self.state = PollerState::Stopped;
        tracing::debug!(exit = ?exit, "shutdown poller stopped");
        exit
    }

    async fn poll(&self, token: &CancellationToken, halt: &CancellationToken) -> PollerExit {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            interval_ms = self.interval.as_millis() as u64,
            "shutdown poller started"
        );

        loop {
            tokio::select! {
                biased;
                _ = halt.cancelled() => {
                    return if token.is_cancelled() {
                        PollerExit::Cancelled
                    } else {
                        PollerExit::Halted
                    };
                }
                _ = ticker.tick() => {
                    if self.host.shutdown_requested() {
                        tracing::info!("host requested shutdown, cancelling receiver");
                        token.cancel();
                        return PollerExit::ShutdownRequested;
                    }
                }
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
