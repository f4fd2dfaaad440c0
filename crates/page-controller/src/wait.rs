//! Poll-based wait utilities (C5). Every helper here polls at a fixed
//! interval against a caller-supplied async predicate and turns an elapsed
//! deadline into `PageError::Timeout`, matching the teacher's wait primitive
//! (evaluate, check, sleep, repeat) rather than trying to be purely
//! event-driven.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::PageError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Clamps a caller-requested timeout into `[0, MAX_TIMEOUT]`, falling back to
/// `DEFAULT_TIMEOUT` when none is given.
pub fn clamp_timeout(requested: Option<Duration>) -> Duration {
    match requested {
        Some(d) if d > MAX_TIMEOUT => MAX_TIMEOUT,
        Some(d) => d,
        None => DEFAULT_TIMEOUT,
    }
}

/// Polls `predicate` until it returns `Ok(Some(value))`, the deadline
/// elapses (`PageError::Timeout`), or the predicate itself errors.
pub async fn wait_for_condition<F, Fut, T>(
    what: &str,
    deadline: Duration,
    mut predicate: F,
) -> Result<T, PageError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>, PageError>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = predicate().await? {
            return Ok(value);
        }
        if start.elapsed() >= deadline {
            return Err(PageError::Timeout(what.to_string()));
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Waits until `quiet_for` elapses with `activity()` reporting no new
/// activity, used for both network-idle and DOM-mutation settle checks.
/// `activity()` returns a monotonically increasing counter; a stall is
/// detected when the value is unchanged across `quiet_for`.
pub async fn wait_for_quiet<F, Fut>(
    what: &str,
    deadline: Duration,
    quiet_for: Duration,
    mut activity: F,
) -> Result<(), PageError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = u64>,
{
    let start = Instant::now();
    let mut last_value = activity().await;
    let mut quiet_since = Instant::now();

    loop {
        sleep(POLL_INTERVAL).await;
        let current = activity().await;
        if current != last_value {
            last_value = current;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= quiet_for {
            return Ok(());
        }

        if start.elapsed() >= deadline {
            return Err(PageError::Timeout(what.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn wait_for_condition_resolves_once_true() {
        let counter = AtomicU32::new(0);
        let result = wait_for_condition("counter", Duration::from_secs(1), || async {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n >= 2 {
                Ok(Some(n))
            } else {
                Ok(None)
            }
        })
        .await
        .unwrap();
        assert!(result >= 2);
    }

    #[tokio::test]
    async fn wait_for_condition_times_out() {
        let result: Result<(), PageError> =
            wait_for_condition("never", Duration::from_millis(150), || async { Ok(None) }).await;
        assert!(matches!(result, Err(PageError::Timeout(_))));
    }

    #[tokio::test]
    async fn wait_for_quiet_detects_stall() {
        let counter = AtomicU32::new(0);
        wait_for_quiet(
            "network",
            Duration::from_secs(1),
            Duration::from_millis(120),
            || async { counter.fetch_add(0, Ordering::SeqCst) as u64 },
        )
        .await
        .unwrap();
    }

    #[test]
    fn clamp_timeout_caps_at_max() {
        assert_eq!(clamp_timeout(Some(Duration::from_secs(10_000))), MAX_TIMEOUT);
        assert_eq!(clamp_timeout(None), DEFAULT_TIMEOUT);
        assert_eq!(clamp_timeout(Some(Duration::from_secs(5))), Duration::from_secs(5));
    }
}
