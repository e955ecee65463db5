use std::sync::atomic::{AtomicU64, Ordering};

/// Receives per-batch counts from every worker.
///
/// Implementations are shared across workers and must tolerate concurrent calls.
pub trait Observer: Send + Sync {
    /// A batch of `count` events is about to be attempted.
    fn new_batch(&self, count: usize);

    /// Events written to the connection.
    fn acked(&self, count: usize);

    /// Events that failed encoding and will never be sent.
    fn dropped(&self, count: usize);

    /// Events handed back for another attempt.
    fn retried(&self, count: usize);

    /// Events abandoned undelivered, after the retry budget ran out or at shutdown.
    fn failed(&self, count: usize);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn new_batch(&self, _count: usize) {}
    fn acked(&self, _count: usize) {}
    fn dropped(&self, _count: usize) {}
    fn retried(&self, _count: usize) {}
    fn failed(&self, _count: usize) {}
}

/// Observer that keeps running totals in atomic counters.
#[derive(Debug, Default)]
pub struct StatsObserver {
    batches: AtomicU64,
    events: AtomicU64,
    acked: AtomicU64,
    dropped: AtomicU64,
    retried: AtomicU64,
    failed: AtomicU64,
}

impl StatsObserver {
    pub const fn new() -> Self {
        Self {
            batches: AtomicU64::new(0),
            events: AtomicU64::new(0),
            acked: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            retried: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            acked: self.acked.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Observer for StatsObserver {
    fn new_batch(&self, count: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.events.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn acked(&self, count: usize) {
        self.acked.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn dropped(&self, count: usize) {
        self.dropped.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn retried(&self, count: usize) {
        self.retried.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn failed(&self, count: usize) {
        self.failed.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`StatsObserver`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Batches attempted, including resubmissions
    pub batches: u64,
    /// Events attempted, including resubmissions
    pub events: u64,
    pub acked: u64,
    pub dropped: u64,
    pub retried: u64,
    pub failed: u64,
}
