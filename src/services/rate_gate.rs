use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Global token bucket holding at most `capacity` permits. A spent permit
/// returns to the bucket one `interval` after it was taken, so no window of
/// length `interval` ever admits more than `capacity` calls.
///
/// Waiters queue on a fair mutex, so permits are handed out in arrival order. A
/// waiter that is dropped while queued (client went away) leaves the queue
/// without consuming a permit.
pub struct RateGate {
    capacity: usize,
    interval: Duration,
    bucket: Mutex<Bucket>,
}

struct Bucket {
    // Grant times of the permits currently out, oldest first.
    granted: VecDeque<Instant>,
}

impl RateGate {
    pub fn new(capacity: u32, interval: Duration) -> Self {
        let capacity = capacity.max(1) as usize;
        Self {
            capacity,
            interval,
            bucket: Mutex::new(Bucket {
                granted: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Suspends until a permit is available, then takes it. Never rejects.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        loop {
            let now = Instant::now();
            self.refill(&mut bucket, now);
            if bucket.granted.len() < self.capacity {
                bucket.granted.push_back(now);
                return;
            }
            let next_permit = match bucket.granted.front() {
                Some(oldest) => *oldest + self.interval,
                None => now,
            };
            tracing::debug!(
                wait_ms = next_permit.saturating_duration_since(now).as_millis() as u64,
                "rate gate exhausted, waiting for refill"
            );
            sleep_until(next_permit).await;
        }
    }

    /// Permits available right now.
    pub async fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket, Instant::now());
        (self.capacity - bucket.granted.len()) as u32
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        while let Some(oldest) = bucket.granted.front() {
            if now.saturating_duration_since(*oldest) < self.interval {
                break;
            }
            bucket.granted.pop_front();
        }
    }
}
