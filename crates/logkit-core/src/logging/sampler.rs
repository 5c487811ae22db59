//! Burst sampling for production loggers.
//!
//! Records are bucketed by level and a hash of their message. Within each
//! tick a bucket lets its first `initial` records through, then only every
//! `thereafter`-th one. Buckets reset when their tick elapses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::entry::Level;

const BUCKETS: usize = 4096;

/// Sampling thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    pub tick: Duration,
    pub initial: u64,
    pub thereafter: u64,
}

impl SamplingPolicy {
    /// 100 records per message per second, then every 100th
    pub const PRODUCTION: Self = Self {
        tick: Duration::from_secs(1),
        initial: 100,
        thereafter: 100,
    };
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

#[derive(Default)]
struct Counter {
    /// Nanoseconds since the sampler epoch at which the window ends
    reset_at: AtomicU64,
    count: AtomicU64,
}

impl Counter {
    fn incr_check_reset(&self, now: u64, tick: u64) -> u64 {
        let reset_at = self.reset_at.load(Ordering::Acquire);
        if reset_at > now {
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }

        self.count.store(1, Ordering::Release);
        if self
            .reset_at
            .compare_exchange(reset_at, now + tick, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // another thread opened the window first
            return self.count.fetch_add(1, Ordering::AcqRel) + 1;
        }
        1
    }
}

/// Lock-free per-bucket rate sampler.
pub struct Sampler {
    policy: SamplingPolicy,
    epoch: Instant,
    counters: Box<[Counter]>,
}

impl Sampler {
    pub fn new(policy: SamplingPolicy) -> Self {
        Self {
            policy,
            epoch: Instant::now(),
            counters: (0..Level::COUNT * BUCKETS).map(|_| Counter::default()).collect(),
        }
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Whether a record with this level and message should be written.
    /// Fatal records always pass.
    pub fn allow(&self, level: Level, message: &str) -> bool {
        self.allow_at(level, message, Instant::now())
    }

    pub(crate) fn allow_at(&self, level: Level, message: &str, now: Instant) -> bool {
        if level == Level::Fatal {
            return true;
        }

        let bucket = level.index() * BUCKETS + fnv32a(message) as usize % BUCKETS;
        let now = now.saturating_duration_since(self.epoch).as_nanos() as u64;
        let tick = self.policy.tick.as_nanos() as u64;

        let n = self.counters[bucket].incr_check_reset(now, tick);
        if n <= self.policy.initial {
            return true;
        }
        self.policy.thereafter > 0 && (n - self.policy.initial) % self.policy.thereafter == 0
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").field("policy", &self.policy).finish()
    }
}

fn fnv32a(s: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ b as u32).wrapping_mul(PRIME))
}
