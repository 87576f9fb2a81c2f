use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{Result, SyncError};

pub const DEFAULT_RATE: f64 = 5.0;
const MIN_RATE: f64 = 0.1;

/// Token-bucket pacer with a single-token capacity.
///
/// The bucket fills at `rate` tokens per second. Holding capacity at one
/// token keeps request spacing even instead of allowing bursts against the
/// upstream quota.
pub struct RateLimiter {
    tokens: f64,
    rate: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// A non-positive `rate` selects the default of 5 requests/second;
    /// positive rates are floored at 0.1.
    pub fn new(rate: f64) -> Self {
        let rate = if rate <= 0.0 || rate.is_nan() {
            DEFAULT_RATE
        } else {
            rate.max(MIN_RATE)
        };

        Self {
            tokens: 1.0,
            rate,
            last_refill: Instant::now(),
        }
    }

    /// Suspend until a token is available or `cancel` fires.
    ///
    /// Cancellation returns `SyncError::Cancelled` without consuming a
    /// token; the limiter stays usable afterwards.
    pub async fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            self.refill();

            if self.tokens >= 1.0 {
                self.tokens -= 1.0;
                return Ok(());
            }

            let wait = Duration::from_secs_f64((1.0 - self.tokens) / self.rate);
            trace!(?wait, "rate limited");

            tokio::select! {
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(1.0);
        self.last_refill = now;
    }
}
