//! Injectable clock for retry and polling loops.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of delays and elapsed time for loops that wait between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Real delays on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: returns immediately and records every requested delay.
///
/// `now()` advances by the total slept time, so elapsed durations measured
/// against it are deterministic.
#[derive(Debug)]
pub struct RecordingSleeper {
    origin: Instant,
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            slept: Mutex::new(Vec::new()),
        }
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|slept| slept.clone())
            .unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
        tokio::task::yield_now().await;
    }

    fn now(&self) -> Instant {
        self.origin + self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sleeper_advances_virtual_time() {
        let sleeper = RecordingSleeper::new();
        let start = sleeper.now();

        sleeper.sleep(Duration::from_secs(2)).await;
        sleeper.sleep(Duration::from_millis(500)).await;

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_millis(500)]
        );
        assert_eq!(sleeper.now() - start, Duration::from_millis(2500));
    }

    #[test]
    fn test_tokio_sleeper_waits() {
        tokio_test::block_on(async {
            let sleeper = TokioSleeper;
            let start = sleeper.now();
            sleeper.sleep(Duration::from_millis(5)).await;
            assert!(sleeper.now() - start >= Duration::from_millis(5));
        });
    }
}
