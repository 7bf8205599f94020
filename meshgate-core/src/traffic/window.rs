use crate::clock::Clock;
use std::sync::{Arc, RwLock};

/// One time slice of the rolling window.
#[derive(Debug, Default, Clone)]
struct Bucket {
    /// First-write time of the current occupancy; zero means never written.
    timestamp: u64,
    total_requests: u64,
    failure_count: u64,
    total_response_time_ms: u64,
}

/// Aggregated view over the in-window buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub total_requests: u64,
    pub failure_count: u64,
    pub success_count: u64,
    /// Percentage in [0, 100].
    pub failure_rate: f64,
    pub average_response_time_ms: f64,
}

/// Lock-guarded bucketed counter for success/failure/latency over a rolling
/// interval. Each sample lands in exactly one bucket; buckets whose
/// timestamp fell out of the window are excluded from aggregation and reset
/// on the next write mapped to their slot.
#[derive(Debug)]
pub struct SlidingWindow {
    window_size_ms: u64,
    bucket_size_ms: u64,
    buckets: RwLock<Vec<Bucket>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindow {
    pub fn new(window_size_ms: u64, bucket_count: u32, clock: Arc<dyn Clock>) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            window_size_ms,
            bucket_size_ms: (window_size_ms / bucket_count as u64).max(1),
            buckets: RwLock::new(vec![Bucket::default(); bucket_count as usize]),
            clock,
        }
    }

    pub fn add_sample(&self, success: bool, response_time_ms: u64) {
        let now = self.clock.now_millis();
        let mut buckets = self.buckets.write().expect("window lock poisoned");
        let slot = ((now / self.bucket_size_ms) % buckets.len() as u64) as usize;

        let bucket = &mut buckets[slot];
        let stale = bucket.total_requests > 0
            && now.saturating_sub(bucket.timestamp) >= self.window_size_ms;
        if stale {
            *bucket = Bucket::default();
        }
        if bucket.total_requests == 0 {
            bucket.timestamp = now;
        }

        bucket.total_requests += 1;
        if !success {
            bucket.failure_count += 1;
        }
        bucket.total_response_time_ms += response_time_ms;
    }

    pub fn stats(&self) -> WindowStats {
        let now = self.clock.now_millis();
        let buckets = self.buckets.read().expect("window lock poisoned");

        let mut total_requests = 0u64;
        let mut failure_count = 0u64;
        let mut total_rt = 0u64;

        for bucket in buckets.iter() {
            if bucket.total_requests == 0
                || now.saturating_sub(bucket.timestamp) >= self.window_size_ms
            {
                continue;
            }
            total_requests += bucket.total_requests;
            failure_count += bucket.failure_count;
            total_rt += bucket.total_response_time_ms;
        }

        let failure_rate = if total_requests == 0 {
            0.0
        } else {
            failure_count as f64 * 100.0 / total_requests as f64
        };

        let average_response_time_ms = if total_requests == 0 {
            0.0
        } else {
            total_rt as f64 / total_requests as f64
        };

        WindowStats {
            total_requests,
            failure_count,
            success_count: total_requests - failure_count,
            failure_rate,
            average_response_time_ms,
        }
    }

    pub fn reset(&self) {
        let mut buckets = self.buckets.write().expect("window lock poisoned");
        for bucket in buckets.iter_mut() {
            *bucket = Bucket::default();
        }
    }
}
