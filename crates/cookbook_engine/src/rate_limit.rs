use std::collections::VecDeque;
use std::time::Duration;

use cookbook_logging::cookbook_debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::settings::{ConfigError, RateLimitSettings};

/// Sliding-window limiter: at most `calls` acquisitions in any trailing `period`.
///
/// Waiters are served in FIFO order because the window is guarded by a fair
/// async mutex that stays held while a caller sleeps.
#[derive(Debug)]
pub struct RateLimiter {
    calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            calls: settings.calls as usize,
            period: settings.period,
            window: Mutex::new(VecDeque::with_capacity(settings.calls as usize)),
        })
    }

    /// Waits until a call fits in the window, then records it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while let Some(&oldest) = window.front() {
                if now.duration_since(oldest) >= self.period {
                    window.pop_front();
                } else {
                    break;
                }
            }
            if window.len() < self.calls {
                window.push_back(now);
                return;
            }
            // Full window: the front entry is the next to expire.
            let Some(&oldest) = window.front() else {
                continue;
            };
            let wait = (oldest + self.period).saturating_duration_since(now);
            cookbook_debug!("rate limit reached, sleeping {} ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}
