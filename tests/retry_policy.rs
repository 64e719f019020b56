use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use storefront_checkout_api::retry::RetryPolicy;

#[tokio::test(start_paused = true)]
async fn exhausts_attempts_with_fixed_delay() {
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let calls = AtomicUsize::new(0);

    let started = tokio::time::Instant::now();
    let result: Result<Option<()>, &str> = policy
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await;

    assert_eq!(result, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Two sleeps between three attempts; none after the last.
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn stops_on_first_success() {
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let calls = AtomicUsize::new(0);

    let result: Result<Option<u32>, &str> = policy
        .run(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt >= 2 {
                    Ok(Some(42))
                } else {
                    Ok(None)
                }
            }
        })
        .await;

    assert_eq!(result, Ok(Some(42)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn errors_abort_immediately() {
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let calls = AtomicUsize::new(0);

    let started = tokio::time::Instant::now();
    let result: Result<Option<()>, &str> = policy
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom") }
        })
        .await;

    assert_eq!(result, Err("boom"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn zero_attempts_still_runs_once() {
    let policy = RetryPolicy::new(0, Duration::from_secs(1));
    let calls = AtomicUsize::new(0);

    let result: Result<Option<()>, &str> = policy
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await;

    assert_eq!(result, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
