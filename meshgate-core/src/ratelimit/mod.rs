#[cfg(test)]
mod tests;

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Entries not acquired from for this long are eligible for eviction.
const IDLE_EXPIRE_MS: u64 = 300_000;
/// Eviction sweeps run at most this often.
const GC_INTERVAL_MS: u64 = 60_000;
/// Hard cap on limiter entries; dynamic keys (per-ip, per-user) must not
/// grow the cache without bound.
const MAX_ENTRIES: usize = 100_000;

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug)]
struct BucketInner {
    tokens: f64,
    last_refill: Instant,
    rate_per_sec: f64,
    burst: f64,
}

/// Token bucket with fractional refill.
///
/// The async mutex keeps waiting acquirers on the runtime instead of
/// blocking a worker thread.
#[derive(Debug)]
pub struct TokenBucket {
    inner: Mutex<BucketInner>,
    last_access: AtomicU64,
}

impl TokenBucket {
    fn new(requests_per_second: f64) -> Self {
        let rate = requests_per_second.max(0.001);
        let burst = rate.max(1.0);
        Self {
            inner: Mutex::new(BucketInner {
                tokens: burst,
                last_refill: Instant::now(),
                rate_per_sec: rate,
                burst,
            }),
            last_access: AtomicU64::new(epoch_millis()),
        }
    }

    /// Take one token, waiting up to `timeout_ms` for a refill.
    ///
    /// A zero timeout never waits; with a positive timeout the acquirer
    /// sleeps exactly as long as the refill needs, or gives up immediately
    /// when the deficit cannot be covered within the budget.
    pub async fn try_acquire(&self, timeout_ms: u64) -> bool {
        self.last_access.store(epoch_millis(), Ordering::Relaxed);

        let wait = {
            let mut inner = self.inner.lock().await;
            Self::refill(&mut inner);

            if inner.tokens >= 1.0 {
                inner.tokens -= 1.0;
                return true;
            }

            if timeout_ms == 0 {
                return false;
            }

            let deficit = 1.0 - inner.tokens;
            let wait = Duration::from_secs_f64(deficit / inner.rate_per_sec);
            if wait > Duration::from_millis(timeout_ms) {
                return false;
            }
            wait
        };

        tokio::time::sleep(wait).await;

        let mut inner = self.inner.lock().await;
        Self::refill(&mut inner);
        if inner.tokens >= 1.0 {
            inner.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(inner: &mut BucketInner) {
        let elapsed = inner.last_refill.elapsed();
        inner.last_refill = Instant::now();
        inner.tokens = (inner.tokens + elapsed.as_secs_f64() * inner.rate_per_sec).min(inner.burst);
    }

    fn idle_since(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_access.load(Ordering::Relaxed))
    }
}

#[derive(Debug)]
struct WindowInner {
    current_count: u64,
    prev_count: u64,
    window_start: Instant,
    max_per_window: u64,
    window: Duration,
}

/// Count-based limiter approximating a true sliding window by blending the
/// previous window's count with the current one:
///
///   estimated = prev × (1 − elapsed_ratio) + current
///
/// which avoids the fixed-window burst at window boundaries. Never waits;
/// the acquire timeout only applies to the token-bucket algorithm.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    inner: Mutex<WindowInner>,
    last_access: AtomicU64,
}

impl SlidingWindowLimiter {
    fn new(requests_per_second: f64) -> Self {
        Self {
            inner: Mutex::new(WindowInner {
                current_count: 0,
                prev_count: 0,
                window_start: Instant::now(),
                max_per_window: (requests_per_second.ceil() as u64).max(1),
                window: Duration::from_secs(1),
            }),
            last_access: AtomicU64::new(epoch_millis()),
        }
    }

    pub async fn allow(&self) -> bool {
        self.last_access.store(epoch_millis(), Ordering::Relaxed);

        let mut inner = self.inner.lock().await;
        let mut elapsed = inner.window_start.elapsed();

        if elapsed >= inner.window * 2 {
            inner.prev_count = 0;
            inner.current_count = 0;
            inner.window_start = Instant::now();
            elapsed = Duration::ZERO;
        } else if elapsed >= inner.window {
            inner.prev_count = inner.current_count;
            inner.current_count = 0;
            let window = inner.window;
            inner.window_start += window;
            elapsed -= inner.window;
        }

        let ratio = elapsed.as_secs_f64() / inner.window.as_secs_f64();
        let estimated = inner.prev_count as f64 * (1.0 - ratio) + inner.current_count as f64;

        if estimated < inner.max_per_window as f64 {
            inner.current_count += 1;
            true
        } else {
            false
        }
    }

    fn idle_since(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_access.load(Ordering::Relaxed))
    }
}

/// Keyed limiter cache with time-based eviction.
///
/// One limiter per limit key; idle entries are swept so per-ip and per-user
/// keys cannot grow the map forever.
pub struct RateLimiterCache {
    buckets: DashMap<String, Arc<TokenBucket>>,
    windows: DashMap<String, Arc<SlidingWindowLimiter>>,
    last_gc: AtomicU64,
}

impl Default for RateLimiterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterCache {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            windows: DashMap::new(),
            last_gc: AtomicU64::new(epoch_millis()),
        }
    }

    pub fn get_or_create(&self, key: &str, requests_per_second: f64) -> Arc<TokenBucket> {
        self.maybe_gc();

        if let Some(existing) = self.buckets.get(key) {
            return existing.value().clone();
        }

        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(requests_per_second)))
            .value()
            .clone()
    }

    pub fn get_or_create_window(
        &self,
        key: &str,
        requests_per_second: f64,
    ) -> Arc<SlidingWindowLimiter> {
        self.maybe_gc();

        if let Some(existing) = self.windows.get(key) {
            return existing.value().clone();
        }

        self.windows
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SlidingWindowLimiter::new(requests_per_second)))
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.buckets.len() + self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.windows.is_empty()
    }

    fn maybe_gc(&self) {
        let now = epoch_millis();
        let last = self.last_gc.load(Ordering::Relaxed);

        let over_capacity = self.len() >= MAX_ENTRIES;
        if !over_capacity && now.saturating_sub(last) < GC_INTERVAL_MS {
            return;
        }
        if self
            .last_gc
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            // Another caller is already sweeping.
            return;
        }

        self.buckets
            .retain(|_, bucket| bucket.idle_since(now) < IDLE_EXPIRE_MS);
        self.windows
            .retain(|_, window| window.idle_since(now) < IDLE_EXPIRE_MS);

        if self.len() >= MAX_ENTRIES {
            // Still over the cap after the idle sweep; drop everything
            // rather than letting the maps grow without bound.
            self.buckets.clear();
            self.windows.clear();
        }
    }
}
