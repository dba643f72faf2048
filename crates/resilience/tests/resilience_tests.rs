//! Integration tests for the retry strategy

use adrelay_resilience::{
    retry_with_backoff, RetryError, RetryPolicy, Retryable, TimeoutCategory, TimeoutConfig,
};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
enum UpstreamError {
    RateLimited,
    ServiceUnavailable,
    Validation(&'static str),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::RateLimited => write!(f, "rate limited"),
            UpstreamError::ServiceUnavailable => write!(f, "service unavailable"),
            UpstreamError::Validation(field) => write!(f, "missing {}", field),
        }
    }
}

impl Retryable for UpstreamError {
    fn is_retryable(&self) -> bool {
        !matches!(self, UpstreamError::Validation(_))
    }
}

/// Records when each attempt started, relative to the test start
fn attempt_log() -> Arc<Mutex<Vec<Duration>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_twice_then_success() {
    init_logging();
    let started = Instant::now();
    let log = attempt_log();
    let policy = RetryPolicy::default();

    let result = retry_with_backoff(&policy, "meta.create_campaign", || {
        let log = log.clone();
        async move {
            let mut starts = log.lock().map_err(|_| UpstreamError::ServiceUnavailable)?;
            starts.push(started.elapsed());
            if starts.len() <= 2 {
                Err(UpstreamError::RateLimited)
            } else {
                Ok("120200000001")
            }
        }
    })
    .await;

    let outcome = result.expect("third attempt should succeed");
    assert_eq!(outcome.value, "120200000001");
    assert_eq!(outcome.attempts, 3);

    let starts = log.lock().expect("lock").clone();
    assert_eq!(
        starts,
        vec![Duration::ZERO, Duration::from_secs(1), Duration::from_secs(3)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_every_attempt_fails_with_original_error() {
    init_logging();
    let log = attempt_log();
    let policy = RetryPolicy::default().with_timeout(Duration::from_secs(300));

    let result = retry_with_backoff(&policy, "tiktok.pause_adset", || {
        let log = log.clone();
        async move {
            if let Ok(mut starts) = log.lock() {
                starts.push(Duration::ZERO);
            }
            Err::<(), _>(UpstreamError::ServiceUnavailable)
        }
    })
    .await;

    assert_eq!(log.lock().expect("lock").len(), 4);
    let err = result.expect_err("should exhaust retries");
    assert_eq!(err.attempts(), 4);
    assert!(!err.is_timeout());
    let last = err.into_error().expect("last error");
    assert_eq!(last, UpstreamError::ServiceUnavailable);
    assert!(last.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_validation_error_single_attempt_no_sleep() {
    let started = Instant::now();
    let log = attempt_log();

    let result = retry_with_backoff(&RetryPolicy::default(), "meta.create_campaign", || {
        let log = log.clone();
        async move {
            if let Ok(mut starts) = log.lock() {
                starts.push(Duration::ZERO);
            }
            Err::<(), _>(UpstreamError::Validation("ad_account_id"))
        }
    })
    .await;

    assert_eq!(log.lock().expect("lock").len(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(matches!(
        result,
        Err(RetryError::Failed {
            attempts: 1,
            error: UpstreamError::Validation("ad_account_id"),
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_budget_from_timeout_config() {
    let timeouts = TimeoutConfig::default();
    let policy = RetryPolicy::new(10)
        .with_base_delay(Duration::from_secs(5))
        .with_timeout(timeouts.get_timeout(TimeoutCategory::ApiCall));
    let started = Instant::now();

    let result = retry_with_backoff(&policy, "google.get_status", || async {
        Err::<(), _>(UpstreamError::ServiceUnavailable)
    })
    .await;

    let err = result.expect_err("budget should run out");
    assert!(err.is_timeout());
    assert!(started.elapsed() <= Duration::from_secs(30));
    assert!(err.attempts() < policy.max_attempts());
}
