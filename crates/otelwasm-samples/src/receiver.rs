//! Receiver that produces nothing and waits to be told to stop.

use otelwasm_guest::{
    async_trait, CancellationToken, LogsReceiver, MetricsReceiver, Signal, TracesReceiver,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReceiver;

impl NoopReceiver {
    async fn idle(&self, signal: Signal, token: CancellationToken) {
        tracing::debug!(signal = %signal, "noop receiver idle");
        token.cancelled().await;
        tracing::debug!(signal = %signal, "noop receiver stopped");
    }
}

#[async_trait]
impl TracesReceiver for NoopReceiver {
    async fn start_traces(&self, token: CancellationToken) {
        self.idle(Signal::Traces, token).await
    }
}

#[async_trait]
impl MetricsReceiver for NoopReceiver {
    async fn start_metrics(&self, token: CancellationToken) {
        self.idle(Signal::Metrics, token).await
    }
}

#[async_trait]
impl LogsReceiver for NoopReceiver {
    async fn start_logs(&self, token: CancellationToken) {
        self.idle(Signal::Logs, token).await
    }
}
