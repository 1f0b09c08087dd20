use std::sync::Arc;

use cookbook_logging::{cookbook_info, cookbook_warn};
use thiserror::Error;
use tokio::time::Instant;

use crate::fetch::Transport;
use crate::rate_limit::RateLimiter;
use crate::settings::{ConfigError, RateLimitSettings, RetryPolicy};
use crate::{AttemptOutcome, FetchAttempt, FetchError, FetchRequest, FetchResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Non-transient failure; no retry was made.
    #[error("request rejected: {0}")]
    Rejected(FetchError),
    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: FetchError },
}

impl FetchFailure {
    pub fn last_error(&self) -> &FetchError {
        match self {
            FetchFailure::Rejected(err) => err,
            FetchFailure::Exhausted { last, .. } => last,
        }
    }
}

/// Rate-limited fetcher with bounded exponential-backoff retries.
pub struct RetryingFetcher {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limit: RateLimitSettings,
        policy: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self {
            transport,
            limiter: RateLimiter::new(rate_limit)?,
            policy,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchFailure> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.limiter.acquire().await;

            let started = Instant::now();
            let outcome = AttemptOutcome::classify(self.transport.send(request).await);
            let record = FetchAttempt {
                url: &request.url,
                attempt,
                elapsed: started.elapsed(),
                outcome: &outcome,
            }
            .to_string();

            match outcome {
                AttemptOutcome::Success(response) => {
                    cookbook_info!("fetch {}", record);
                    return Ok(response);
                }
                AttemptOutcome::Fatal(err) => {
                    cookbook_warn!("fetch {}", record);
                    return Err(FetchFailure::Rejected(err));
                }
                AttemptOutcome::Transient(err) => {
                    cookbook_warn!("fetch {}", record);
                    if attempt >= self.policy.max_attempts {
                        return Err(FetchFailure::Exhausted {
                            attempts: attempt,
                            last: err,
                        });
                    }
                    let delay = self.policy.backoff(attempt);
                    cookbook_info!(
                        "retrying {} in {} ms ({}/{})",
                        request.url,
                        delay.as_millis(),
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
