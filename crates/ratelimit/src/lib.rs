use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use pageloom_core::{BackoffParam, HostTiming};
use pageloom_retry::{compute_jitter, exponential_backoff_delay};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Per-host politeness bookkeeping. Yields, on demand, how long a caller
/// must wait before the next fetch to a given host.
///
/// The RNG sits behind its own lock, separate from the per-host timing map
/// (itself a sharded `DashMap`), so a jitter draw never blocks a timing read
/// for an unrelated host.
pub struct RateLimiter {
    base_delay: RwLock<Duration>,
    jitter: RwLock<Duration>,
    backoff_param: RwLock<BackoffParam>,
    rng: Mutex<StdRng>,
    timings: DashMap<String, HostTiming>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            base_delay: RwLock::new(Duration::from_millis(500)),
            jitter: RwLock::new(Duration::from_millis(250)),
            backoff_param: RwLock::new(BackoffParam::default()),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            timings: DashMap::new(),
        }
    }

    pub fn set_base_delay(&self, delay: Duration) {
        *self.base_delay.write().unwrap() = delay;
    }

    pub fn set_jitter(&self, jitter: Duration) {
        *self.jitter.write().unwrap() = jitter;
    }

    pub fn set_random_seed(&self, seed: u64) {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
    }

    pub fn set_backoff_param(&self, param: BackoffParam) {
        *self.backoff_param.write().unwrap() = param;
    }

    /// Installs or updates a host's minimum delay (e.g. from robots
    /// `Crawl-delay`). Creates the timing entry if absent; otherwise touches
    /// only `crawl_delay`.
    pub fn set_crawl_delay(&self, host: &str, delay: Duration) {
        self.timings
            .entry(host.to_string())
            .and_modify(|t| t.crawl_delay = delay)
            .or_insert_with(|| HostTiming {
                crawl_delay: delay,
                ..HostTiming::default()
            });
    }

    pub fn mark_last_fetch_as_now(&self, host: &str) {
        self.timings
            .entry(host.to_string())
            .and_modify(|t| t.last_fetch_at = Some(Instant::now()))
            .or_insert_with(|| HostTiming {
                last_fetch_at: Some(Instant::now()),
                ..HostTiming::default()
            });
    }

    /// Increments the host's backoff count and recomputes its backoff delay.
    /// Never touches `last_fetch_at`.
    pub fn backoff(&self, host: &str) {
        let param = *self.backoff_param.read().unwrap();
        let jitter = *self.jitter.read().unwrap();
        let mut rng = self.rng.lock().unwrap();
        self.timings
            .entry(host.to_string())
            .and_modify(|t| {
                t.backoff_count += 1;
                t.backoff_delay = exponential_backoff_delay(t.backoff_count, jitter, &mut *rng, &param);
            })
            .or_insert_with(|| {
                let mut t = HostTiming::default();
                t.backoff_count = 1;
                t.backoff_delay = exponential_backoff_delay(1, jitter, &mut *rng, &param);
                t
            });
    }

    /// Clears backoff state for `host`. A no-op if the host has no timing
    /// entry. Never touches `last_fetch_at`.
    pub fn reset_backoff(&self, host: &str) {
        if let Some(mut entry) = self.timings.get_mut(host) {
            entry.backoff_count = 0;
            entry.backoff_delay = Duration::ZERO;
        }
    }

    /// `max(base_delay, crawl_delay, backoff_delay) + jitter − elapsed`,
    /// clamped to zero. Zero when `host` has no timing entry at all.
    pub fn resolve_delay(&self, host: &str) -> Duration {
        let Some(timing) = self.timings.get(host) else {
            return Duration::ZERO;
        };
        let base = *self.base_delay.read().unwrap();
        let floor = base.max(timing.crawl_delay).max(timing.backoff_delay);

        let jitter_max = *self.jitter.read().unwrap();
        let drawn_jitter = {
            let mut rng = self.rng.lock().unwrap();
            compute_jitter(jitter_max, &mut *rng)
        };

        let elapsed = timing
            .last_fetch_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);

        (floor + drawn_jitter).saturating_sub(elapsed)
    }

    /// Shallow copy of a host's current timing state, for observability or
    /// tests. Never an alias into internal state.
    pub fn host_timing(&self, host: &str) -> Option<HostTiming> {
        self.timings.get(host).map(|t| t.clone())
    }
}
