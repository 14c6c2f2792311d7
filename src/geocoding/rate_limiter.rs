use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum delay between consecutive calls.
///
/// The first call goes through immediately; every later call waits until
/// `min_delay` has passed since the previous one started.
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: Mutex::new(None),
        }
    }

    /// Waits for the next slot and claims it.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            sleep_until(previous + self.min_delay).await;
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_by_min_delay() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_when_delay_already_elapsed() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.wait().await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let before = Instant::now();
        limiter.wait().await;
        assert!(before.elapsed() < Duration::from_millis(1));
    }
}
