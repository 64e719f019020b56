use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed delay between attempts. Handlers receive the
/// policy through `AppState` so tests can shrink it or run under paused time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `op` until it yields `Some`, up to `max_attempts` times. `None`
    /// after the final attempt stays `None`; errors abort immediately.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        for attempt in 1..=self.max_attempts.max(1) {
            if let Some(value) = op().await? {
                return Ok(Some(value));
            }
            if attempt < self.max_attempts {
                tracing::debug!(attempt, delay_ms = self.delay.as_millis() as u64, "retrying");
                tokio::time::sleep(self.delay).await;
            }
        }
        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
