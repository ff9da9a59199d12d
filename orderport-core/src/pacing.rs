//! Pacing between order submissions.
//!
//! The upload driver calls `wait_before_next` after every attempt. The
//! shipped policy is a fixed, unconditional delay; stricter or adaptive
//! policies plug in behind the same trait.

use async_trait::async_trait;
use std::time::Duration;

/// Strategy deciding how long to pause between two requests.
#[async_trait]
pub trait PacingPolicy: Send + Sync {
    async fn wait_before_next(&self);
}

/// Sleep for the same interval after every attempt, whatever its outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}

#[async_trait]
impl PacingPolicy for FixedDelay {
    async fn wait_before_next(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// No pause at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl PacingPolicy for NoDelay {
    async fn wait_before_next(&self) {}
}
