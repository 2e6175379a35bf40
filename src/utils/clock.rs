use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::Instant;

/// Source of monotonic elapsed time, in milliseconds since an arbitrary origin.
pub trait MonotonicClock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Deterministic clock for tests. Every read advances time by `tick_ms`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    tick_ms: u64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
            tick_ms: 0,
        }
    }

    pub fn ticking(tick_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(0),
            tick_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Relaxed);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Relaxed);
    }
}

impl MonotonicClock for ManualClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        self.now.fetch_add(self.tick_ms, Relaxed)
    }
}

/// Elapsed-time budget measured against an injected clock.
pub struct TimeBudget<'c> {
    clock: &'c dyn MonotonicClock,
    started_at: u64,
    budget_ms: u64,
}

impl<'c> TimeBudget<'c> {
    pub fn start(clock: &'c dyn MonotonicClock, budget_ms: u64) -> Self {
        Self {
            clock,
            started_at: clock.now_ms(),
            budget_ms,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.now_ms().saturating_sub(self.started_at)
    }

    pub fn remaining_ms(&self) -> u64 {
        self.budget_ms.saturating_sub(self.elapsed_ms())
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.elapsed_ms() >= self.budget_ms
    }
}
