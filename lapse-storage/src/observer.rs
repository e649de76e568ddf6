//! Operation observers.
//!
//! A [`Store`](crate::Store) notifies one injected [`StoreObserver`] after
//! every operation, once its lock has been released. Observers are how
//! counters and gauges get attached to a store without any process-global
//! registry: the default is [`NoopObserver`], [`StatsObserver`] keeps
//! in-process atomics, and [`PrometheusObserver`](crate::PrometheusObserver)
//! feeds a caller-owned Prometheus registry.

use lapse_core::Timestamp;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};

// ============================================================================
// EVENTS
// ============================================================================

/// The store operation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Set,
    Add,
    Replace,
    Delete,
    DeleteExpired,
    Flush,
    Increment,
    Decrement,
    Load,
}

impl StoreOp {
    /// Stable lowercase name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Get => "get",
            StoreOp::Set => "set",
            StoreOp::Add => "add",
            StoreOp::Replace => "replace",
            StoreOp::Delete => "delete",
            StoreOp::DeleteExpired => "delete_expired",
            StoreOp::Flush => "flush",
            StoreOp::Increment => "increment",
            StoreOp::Decrement => "decrement",
            StoreOp::Load => "load",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened during one store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub op: StoreOp,
    /// `false` for a miss, a rejected `add`/`replace`, a failed
    /// increment/decrement, or a delete of an absent key.
    pub succeeded: bool,
    /// Entries physically removed by this operation.
    pub removed: usize,
    /// Entries in the map right after the operation, expired ones included.
    pub item_count: usize,
}

impl StoreEvent {
    pub fn new(op: StoreOp, succeeded: bool, item_count: usize) -> Self {
        Self {
            op,
            succeeded,
            removed: 0,
            item_count,
        }
    }

    pub fn with_removed(mut self, removed: usize) -> Self {
        self.removed = removed;
        self
    }
}

// ============================================================================
// OBSERVER TRAIT
// ============================================================================

/// Sink for store activity.
///
/// Called outside the store lock. Implementations must be cheap and must not
/// block for long, since they run on the caller's thread (or the janitor's).
pub trait StoreObserver: Send + Sync {
    /// Record one completed operation.
    fn record(&self, event: &StoreEvent);

    /// Record a janitor sweep.
    fn janitor_swept(&self, at: Timestamp, removed: usize) {
        let _ = (at, removed);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {
    fn record(&self, _event: &StoreEvent) {}
}

// ============================================================================
// IN-PROCESS STATISTICS
// ============================================================================

/// Observer keeping atomic counters for each operation.
#[derive(Debug, Default)]
pub struct StatsObserver {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    adds: AtomicU64,
    replaces: AtomicU64,
    rejected_writes: AtomicU64,
    deletes: AtomicU64,
    expired_removed: AtomicU64,
    flushes: AtomicU64,
    increments: AtomicU64,
    decrements: AtomicU64,
    failed_mutations: AtomicU64,
    loads: AtomicU64,
    janitor_runs: AtomicU64,
    last_janitor_run_ms: AtomicI64,
    item_count: AtomicUsize,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> StoreStats {
        let last_run = self.last_janitor_run_ms.load(Ordering::Relaxed);
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            adds: self.adds.load(Ordering::Relaxed),
            replaces: self.replaces.load(Ordering::Relaxed),
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            expired_removed: self.expired_removed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            increments: self.increments.load(Ordering::Relaxed),
            decrements: self.decrements.load(Ordering::Relaxed),
            failed_mutations: self.failed_mutations.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            janitor_runs: self.janitor_runs.load(Ordering::Relaxed),
            last_janitor_run: (last_run > 0)
                .then(|| chrono::DateTime::from_timestamp_millis(last_run))
                .flatten(),
            item_count: self.item_count.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl StoreObserver for StatsObserver {
    fn record(&self, event: &StoreEvent) {
        match (event.op, event.succeeded) {
            (StoreOp::Get, true) => Self::bump(&self.hits),
            (StoreOp::Get, false) => Self::bump(&self.misses),
            (StoreOp::Set, _) => Self::bump(&self.sets),
            (StoreOp::Add, true) => Self::bump(&self.adds),
            (StoreOp::Replace, true) => Self::bump(&self.replaces),
            (StoreOp::Add | StoreOp::Replace, false) => Self::bump(&self.rejected_writes),
            (StoreOp::Delete, true) => Self::bump(&self.deletes),
            (StoreOp::Delete, false) => {}
            (StoreOp::DeleteExpired, _) => {
                self.expired_removed
                    .fetch_add(event.removed as u64, Ordering::Relaxed);
            }
            (StoreOp::Flush, _) => Self::bump(&self.flushes),
            (StoreOp::Increment, true) => Self::bump(&self.increments),
            (StoreOp::Decrement, true) => Self::bump(&self.decrements),
            (StoreOp::Increment | StoreOp::Decrement, false) => {
                Self::bump(&self.failed_mutations)
            }
            (StoreOp::Load, _) => Self::bump(&self.loads),
        }

        if event.op != StoreOp::Get {
            self.item_count.store(event.item_count, Ordering::Relaxed);
        }
    }

    fn janitor_swept(&self, at: Timestamp, _removed: usize) {
        Self::bump(&self.janitor_runs);
        self.last_janitor_run_ms
            .store(at.timestamp_millis(), Ordering::Relaxed);
    }
}

/// Snapshot of [`StatsObserver`] counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub adds: u64,
    pub replaces: u64,
    pub rejected_writes: u64,
    pub deletes: u64,
    pub expired_removed: u64,
    pub flushes: u64,
    pub increments: u64,
    pub decrements: u64,
    pub failed_mutations: u64,
    pub loads: u64,
    pub janitor_runs: u64,
    pub last_janitor_run: Option<Timestamp>,
    pub item_count: usize,
}

impl StoreStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Entries removed through `delete` or an expiration sweep.
    pub fn evictions(&self) -> u64 {
        self.deletes + self.expired_removed
    }
}
