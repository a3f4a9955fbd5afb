//! Metrics collection for nonce operations.
//!
//! Remote callers only ever see `valid: true/false`; the per-reason
//! breakdown of rejections lives here and in the debug log. The collector is
//! pluggable so deployments can forward counts to an external monitoring
//! system instead of the in-memory default.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the counters tracked for the nonce service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonceMetrics {
    /// Total number of nonces generated
    pub generated: u64,
    /// Redemptions accepted
    pub redeemed_valid: u64,
    /// Redemptions rejected, by internal reason
    pub rejections: RejectionMetrics,
}

/// Rejected redemptions broken down by internal reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionMetrics {
    /// Decode or authentication failures
    pub malformed: u64,
    /// Prefix mismatches rejected before decoding
    pub wrong_instance: u64,
    /// Counters below the window floor
    pub expired: u64,
    /// Counters already crossed off
    pub already_used: u64,
    /// Counters above the window ceiling
    pub not_yet_issued: u64,
    /// Everything else (crypto failures, exhaustion)
    pub other: u64,
}

/// Events recorded by the nonce service.
#[derive(Debug, Clone, Copy)]
pub enum MetricEvent {
    /// A nonce was generated.
    Generated,
    /// A redemption was accepted.
    RedemptionValid,
    /// A redemption was rejected; `reason` is the stable label from
    /// `NonceError::reason()`.
    RedemptionRejected {
        /// Stable reason label
        reason: &'static str,
    },
}

/// Trait for metrics collection backends.
///
/// Implementations must be thread-safe; events are recorded concurrently
/// from every request. Recording must also be fast and non-blocking: it runs
/// on the redemption path, which is expected to complete in sub-millisecond
/// time. That is why this trait is synchronous, unlike the storage-backed
/// traits elsewhere in the ecosystem: there is no I/O to await.
pub trait MetricsCollector: Send + Sync {
    /// Record a single event.
    fn record_event(&self, event: MetricEvent);

    /// Get a point-in-time snapshot of all collected metrics.
    fn snapshot(&self) -> NonceMetrics;

    /// Reset all counters to zero.
    fn reset(&self);
}

/// In-memory metrics collector on atomic counters.
///
/// The default collector. Suitable for single-instance deployments; counts
/// are lost on restart, which matches the service's own in-memory lifecycle.
#[derive(Debug, Default)]
pub struct InMemoryMetricsCollector {
    generated: AtomicU64,
    redeemed_valid: AtomicU64,
    malformed: AtomicU64,
    wrong_instance: AtomicU64,
    expired: AtomicU64,
    already_used: AtomicU64,
    not_yet_issued: AtomicU64,
    other: AtomicU64,
}

impl InMemoryMetricsCollector {
    /// Create a new collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsCollector for InMemoryMetricsCollector {
    fn record_event(&self, event: MetricEvent) {
        match event {
            MetricEvent::Generated => {
                self.generated.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::RedemptionValid => {
                self.redeemed_valid.fetch_add(1, Ordering::Relaxed);
            }
            MetricEvent::RedemptionRejected { reason } => {
                let counter = match reason {
                    "malformed" => &self.malformed,
                    "wrong_instance" => &self.wrong_instance,
                    "expired" => &self.expired,
                    "already_used" => &self.already_used,
                    "not_yet_issued" => &self.not_yet_issued,
                    _ => &self.other,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn snapshot(&self) -> NonceMetrics {
        NonceMetrics {
            generated: self.generated.load(Ordering::Relaxed),
            redeemed_valid: self.redeemed_valid.load(Ordering::Relaxed),
            rejections: RejectionMetrics {
                malformed: self.malformed.load(Ordering::Relaxed),
                wrong_instance: self.wrong_instance.load(Ordering::Relaxed),
                expired: self.expired.load(Ordering::Relaxed),
                already_used: self.already_used.load(Ordering::Relaxed),
                not_yet_issued: self.not_yet_issued.load(Ordering::Relaxed),
                other: self.other.load(Ordering::Relaxed),
            },
        }
    }

    fn reset(&self) {
        self.generated.store(0, Ordering::Relaxed);
        self.redeemed_valid.store(0, Ordering::Relaxed);
        self.malformed.store(0, Ordering::Relaxed);
        self.wrong_instance.store(0, Ordering::Relaxed);
        self.expired.store(0, Ordering::Relaxed);
        self.already_used.store(0, Ordering::Relaxed);
        self.not_yet_issued.store(0, Ordering::Relaxed);
        self.other.store(0, Ordering::Relaxed);
    }
}

/// Metrics collector that discards all events.
#[derive(Debug, Default)]
pub struct NoOpMetricsCollector;

impl NoOpMetricsCollector {
    /// Create a new no-op collector.
    pub fn new() -> Self {
        Self
    }
}

impl MetricsCollector for NoOpMetricsCollector {
    fn record_event(&self, _event: MetricEvent) {}

    fn snapshot(&self) -> NonceMetrics {
        NonceMetrics::default()
    }

    fn reset(&self) {}
}
