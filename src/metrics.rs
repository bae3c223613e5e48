// Picker metrics
//
// Lightweight counters for the helper channel and the dialog sessions

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters for one picker session
///
/// Uses atomic operations so the response worker and the calling thread can
/// record without locks. Shared through an `Arc` and logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Commands written to the helper
    pub commands_sent: AtomicU64,

    /// Responses fully decoded
    pub responses_read: AtomicU64,

    /// Host event pump slices run while waiting for a reply
    pub pump_iterations: AtomicU64,

    /// Pipe failures (closed, short read, write error)
    pub transport_errors: AtomicU64,

    /// Streams that stopped matching the protocol
    pub desyncs: AtomicU64,

    /// Dialogs shown
    pub dialogs_executed: AtomicU64,

    /// Dialogs the user accepted
    pub dialogs_accepted: AtomicU64,

    /// Total time spent waiting for replies in milliseconds
    pub total_wait_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            commands_sent: AtomicU64::new(0),
            responses_read: AtomicU64::new(0),
            pump_iterations: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            desyncs: AtomicU64::new(0),
            dialogs_executed: AtomicU64::new(0),
            dialogs_accepted: AtomicU64::new(0),
            total_wait_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_response_read(&self, waited: Duration) {
        self.responses_read.fetch_add(1, Ordering::Relaxed);
        self.total_wait_ms
            .fetch_add(waited.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_pump(&self) {
        self.pump_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_desync(&self) {
        self.desyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dialog(&self, accepted: bool) {
        self.dialogs_executed.fetch_add(1, Ordering::Relaxed);
        if accepted {
            self.dialogs_accepted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average wait per response in milliseconds
    pub fn avg_wait_ms(&self) -> f64 {
        let total = self.total_wait_ms.load(Ordering::Relaxed);
        let count = self.responses_read.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Picker Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Commands: {} sent, {} responses read (avg wait {:.2}ms)",
            self.commands_sent.load(Ordering::Relaxed),
            self.responses_read.load(Ordering::Relaxed),
            self.avg_wait_ms()
        );
        tracing::info!(
            "Dialogs: {} executed, {} accepted",
            self.dialogs_executed.load(Ordering::Relaxed),
            self.dialogs_accepted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Event pump slices: {}, transport errors: {}, desyncs: {}",
            self.pump_iterations.load(Ordering::Relaxed),
            self.transport_errors.load(Ordering::Relaxed),
            self.desyncs.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
