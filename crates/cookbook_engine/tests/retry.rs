use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cookbook_engine::{
    ConfigError, FailureKind, FetchError, FetchFailure, FetchRequest, FetchResponse, RateLimitSettings,
    RateLimiter, RetryPolicy, RetryingFetcher, Transport,
};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

/// Replays canned results and records when each attempt happened.
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<FetchResponse, FetchError>>>,
    started: Instant,
    calls: Mutex<Vec<Duration>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<FetchResponse, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            started: Instant::now(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_times(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(self.started.elapsed());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::new(FailureKind::Network, "script exhausted")))
    }
}

fn ok() -> Result<FetchResponse, FetchError> {
    Ok(FetchResponse {
        status: 200,
        final_url: "https://example.com/".into(),
        content_type: Some("text/plain".into()),
        body: b"ok".to_vec(),
    })
}

fn status(code: u16) -> Result<FetchResponse, FetchError> {
    Err(FetchError::new(FailureKind::HttpStatus(code), code.to_string()))
}

fn generous_limit() -> RateLimitSettings {
    RateLimitSettings {
        calls: 1_000,
        period: Duration::from_secs(1),
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(30),
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failures_then_success_back_off_exponentially() {
    let transport = ScriptedTransport::new(vec![
        status(503),
        Err(FetchError::new(FailureKind::Timeout, "slow")),
        ok(),
    ]);
    let fetcher = RetryingFetcher::new(transport.clone(), generous_limit(), policy(3)).unwrap();

    let response = fetcher
        .fetch(&FetchRequest::get("https://example.com/"))
        .await
        .expect("third attempt succeeds");

    assert_eq!(response.body, b"ok");
    assert_eq!(
        transport.call_times(),
        vec![
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(3)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn permanent_client_error_is_not_retried() {
    let transport = ScriptedTransport::new(vec![status(404), ok()]);
    let fetcher = RetryingFetcher::new(transport.clone(), generous_limit(), policy(3)).unwrap();

    let err = fetcher
        .fetch(&FetchRequest::get("https://example.com/missing"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchFailure::Rejected(FetchError::new(FailureKind::HttpStatus(404), "404"))
    );
    assert_eq!(transport.call_times().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_last_error() {
    let transport = ScriptedTransport::new(vec![status(500), status(502), status(429), ok()]);
    let fetcher = RetryingFetcher::new(transport.clone(), generous_limit(), policy(3)).unwrap();

    let err = fetcher
        .fetch(&FetchRequest::get("https://example.com/"))
        .await
        .unwrap_err();

    match &err {
        FetchFailure::Exhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert_eq!(last.kind, FailureKind::HttpStatus(429));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(err.last_error().kind, FailureKind::HttpStatus(429));
    assert_eq!(transport.call_times().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn retries_wait_for_the_rate_limiter() {
    let transport = ScriptedTransport::new(vec![status(503), ok()]);
    let limit = RateLimitSettings {
        calls: 1,
        period: Duration::from_secs(10),
    };
    let fetcher = RetryingFetcher::new(transport.clone(), limit, policy(2)).unwrap();

    fetcher
        .fetch(&FetchRequest::get("https://example.com/"))
        .await
        .unwrap();

    // Backoff is 1s, but the window only frees up after 10s.
    assert_eq!(
        transport.call_times(),
        vec![Duration::ZERO, Duration::from_secs(10)]
    );
}

#[test]
fn backoff_doubles_and_is_capped() {
    let policy = RetryPolicy {
        max_attempts: 10,
        base_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(3),
    };
    let delays: Vec<_> = (1..=5).map(|attempt| policy.backoff(attempt)).collect();
    assert_eq!(
        delays,
        vec![
            Duration::from_millis(500),
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3),
            Duration::from_secs(3),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn limiter_admits_n_calls_per_window() {
    let limiter = RateLimiter::new(RateLimitSettings {
        calls: 2,
        period: Duration::from_secs(10),
    })
    .unwrap();
    let start = Instant::now();

    let mut admitted = Vec::new();
    for _ in 0..5 {
        limiter.acquire().await;
        admitted.push(start.elapsed());
    }

    assert_eq!(
        admitted,
        vec![
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(20),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_waiters_are_served_in_arrival_order() {
    let limiter = Arc::new(
        RateLimiter::new(RateLimitSettings {
            calls: 1,
            period: Duration::from_secs(1),
        })
        .unwrap(),
    );
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for id in 0..3 {
        let limiter = limiter.clone();
        let order = order.clone();
        handles.push(tokio::spawn(async move {
            limiter.acquire().await;
            order.lock().unwrap().push(id);
        }));
        tokio::task::yield_now().await;
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn zero_limits_are_config_errors() {
    let zero_calls = RateLimitSettings {
        calls: 0,
        period: Duration::from_secs(1),
    };
    assert_eq!(
        RateLimiter::new(zero_calls).unwrap_err(),
        ConfigError::NotPositive {
            name: "RATE_LIMIT_CALLS"
        }
    );

    let zero_period = RateLimitSettings {
        calls: 1,
        period: Duration::ZERO,
    };
    assert!(RateLimiter::new(zero_period).is_err());

    let transport = ScriptedTransport::new(Vec::new());
    assert!(RetryingFetcher::new(transport, generous_limit(), policy(0)).is_err());
}
