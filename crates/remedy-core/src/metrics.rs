//! Global atomic counters for Remedy observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. on daemon shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    executions_started: AtomicU64,
    executions_recovered: AtomicU64,
    executions_failed: AtomicU64,
    signals_coalesced: AtomicU64,
    webhooks_rejected: AtomicU64,
    events_deduplicated: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            executions_started: AtomicU64::new(0),
            executions_recovered: AtomicU64::new(0),
            executions_failed: AtomicU64::new(0),
            signals_coalesced: AtomicU64::new(0),
            webhooks_rejected: AtomicU64::new(0),
            events_deduplicated: AtomicU64::new(0),
        }
    }

    pub fn inc_executions_started(&self) {
        self.executions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_executions_recovered(&self) {
        self.executions_recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_executions_failed(&self) {
        self.executions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_signals_coalesced(&self) {
        self.signals_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_webhooks_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_deduplicated(&self) {
        self.events_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (daemon shutdown, periodic tick)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            executions_started = self.executions_started(),
            executions_recovered = self.executions_recovered(),
            executions_failed = self.executions_failed(),
            signals_coalesced = self.signals_coalesced(),
            webhooks_rejected = self.webhooks_rejected(),
            events_deduplicated = self.events_deduplicated(),
        );
    }

    pub fn executions_started(&self) -> u64 {
        self.executions_started.load(Ordering::Relaxed)
    }

    pub fn executions_recovered(&self) -> u64 {
        self.executions_recovered.load(Ordering::Relaxed)
    }

    pub fn executions_failed(&self) -> u64 {
        self.executions_failed.load(Ordering::Relaxed)
    }

    pub fn signals_coalesced(&self) -> u64 {
        self.signals_coalesced.load(Ordering::Relaxed)
    }

    pub fn webhooks_rejected(&self) -> u64 {
        self.webhooks_rejected.load(Ordering::Relaxed)
    }

    pub fn events_deduplicated(&self) -> u64 {
        self.events_deduplicated.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.executions_started.store(0, Ordering::Relaxed);
        self.executions_recovered.store(0, Ordering::Relaxed);
        self.executions_failed.store(0, Ordering::Relaxed);
        self.signals_coalesced.store(0, Ordering::Relaxed);
        self.webhooks_rejected.store(0, Ordering::Relaxed);
        self.events_deduplicated.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.executions_started(), 0);
        m.inc_executions_started();
        m.inc_executions_started();
        assert_eq!(m.executions_started(), 2);

        m.inc_signals_coalesced();
        assert_eq!(m.signals_coalesced(), 1);

        m.inc_webhooks_rejected();
        m.inc_events_deduplicated();
        assert_eq!(m.webhooks_rejected(), 1);
        assert_eq!(m.events_deduplicated(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_executions_started();
        m.inc_executions_recovered();
        m.inc_executions_failed();
        m.reset();
        assert_eq!(m.executions_started(), 0);
        assert_eq!(m.executions_recovered(), 0);
        assert_eq!(m.executions_failed(), 0);
    }
}
