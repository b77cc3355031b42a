use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use error_stack::Report;
use http_poll_comm::retry_with_backoff;
use http_poll_comm::CommError;
use http_poll_comm::CommResult;

#[tokio::test(start_paused = true)]
async fn retry_returns_first_success() {
    let attempts = Arc::new(AtomicU32::new(0));

    let result: CommResult<u32> = retry_with_backoff(
        3,
        Duration::from_secs(1),
        Duration::from_secs(30),
        || {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(Report::new(CommError::Network {
                        message: "flaky".into(),
                    }))
                } else {
                    Ok(n)
                }
            }
        },
    )
    .await;

    assert_eq!(result.expect("third attempt should succeed"), 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn retry_backoff_doubles_between_attempts() {
    let started = tokio::time::Instant::now();

    let result: CommResult<u32> = retry_with_backoff(
        3,
        Duration::from_secs(1),
        Duration::from_secs(30),
        || async {
            Err(Report::new(CommError::Network {
                message: "down".into(),
            }))
        },
    )
    .await;

    assert!(result.is_err(), "all attempts failed");
    // 1s after the first attempt, 2s after the second; no sleep after the last.
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(3),
        "expected at least 3s of backoff, got {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(4),
        "no sleep should follow the final attempt, got {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn retry_backoff_respects_max_delay() {
    let started = tokio::time::Instant::now();

    let result: CommResult<u32> = retry_with_backoff(
        4,
        Duration::from_secs(2),
        Duration::from_secs(3),
        || async {
            Err(Report::new(CommError::Network {
                message: "down".into(),
            }))
        },
    )
    .await;

    assert!(result.is_err());
    // Delays: 2s, then capped at 3s, 3s.
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(8) && elapsed < Duration::from_secs(9),
        "expected ~8s of capped backoff, got {elapsed:?}"
    );
}

#[tokio::test]
async fn retry_with_zero_attempts_is_a_configuration_error() {
    let result: CommResult<u32> = retry_with_backoff(
        0,
        Duration::from_secs(1),
        Duration::from_secs(30),
        || async { Ok(1) },
    )
    .await;

    let report = result.expect_err("zero attempts can never succeed");
    assert!(report.to_string().contains("at least one attempt"));
}
