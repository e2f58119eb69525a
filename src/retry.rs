//! Fixed-delay retry with a bounded attempt budget.
//!
//! [`retry_until`] keeps probing until the probe yields a value, the
//! [`RetryPolicy`] budget is spent, or the [`CancellationToken`] fires.
//! Both the probe and the inter-attempt delay are raced against the token.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on probe invocations. Must be at least 1.
    pub max_attempts: u32,
    /// Constant pause between two consecutive probes.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(10, Duration::from_millis(5000))
    }
}

/// How a [`retry_until`] loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The probe produced a value on attempt `attempts`.
    Ready { value: T, attempts: u32 },
    /// Every attempt in the budget missed.
    Exhausted { attempts: u32 },
    /// The token fired after `attempts` completed probes.
    Cancelled { attempts: u32 },
}

/// Probe until ready, out of budget, or cancelled.
///
/// `probe` receives the 1-based attempt number. When it yields `None`,
/// `on_miss` is called with the same number before any delay, so callers
/// can report progress in attempt order. No delay follows the last attempt.
pub async fn retry_until<T, P, Fut, M>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut probe: P,
    mut on_miss: M,
) -> RetryOutcome<T>
where
    P: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
    M: FnMut(u32),
{
    let mut completed = 0u32;

    for attempt in 1..=policy.max_attempts {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RetryOutcome::Cancelled { attempts: completed },
            result = probe(attempt) => result,
        };
        completed = attempt;

        if let Some(value) = result {
            return RetryOutcome::Ready {
                value,
                attempts: attempt,
            };
        }

        on_miss(attempt);

        if attempt < policy.max_attempts {
            tracing::debug!(
                attempt,
                delay_ms = policy.delay.as_millis() as u64,
                "Waiting before next attempt"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return RetryOutcome::Cancelled { attempts: completed },
                _ = tokio::time::sleep(policy.delay) => {}
            }
        }
    }

    RetryOutcome::Exhausted {
        attempts: completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::fixed(4, Duration::from_secs(5))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay, Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt_has_no_delay() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let misses = Cell::new(0);

        let outcome = retry_until(
            &policy(),
            &cancel,
            |_| async { Some("up") },
            |_| misses.set(misses.get() + 1),
        )
        .await;

        assert_eq!(
            outcome,
            RetryOutcome::Ready {
                value: "up",
                attempts: 1
            }
        );
        assert_eq!(misses.get(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_third_attempt_waits_twice() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let mut missed = Vec::new();

        let outcome = retry_until(
            &policy(),
            &cancel,
            |attempt| async move { (attempt == 3).then_some(attempt) },
            |attempt| missed.push(attempt),
        )
        .await;

        assert_eq!(
            outcome,
            RetryOutcome::Ready {
                value: 3,
                attempts: 3
            }
        );
        assert_eq!(missed, vec![1, 2]);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_skips_trailing_delay() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let probes = Cell::new(0u32);

        let outcome: RetryOutcome<()> = retry_until(
            &policy(),
            &cancel,
            |_| {
                probes.set(probes.get() + 1);
                async { None }
            },
            |_| {},
        )
        .await;

        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 4 });
        assert_eq!(probes.get(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_probe() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome: RetryOutcome<()> =
            retry_until(&policy(), &cancel, |_| async { None }, |_| {}).await;

        assert_eq!(outcome, RetryOutcome::Cancelled { attempts: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_delay() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let outcome: RetryOutcome<()> = retry_until(
            &policy(),
            &cancel,
            |_| async { None },
            |attempt| {
                if attempt == 2 {
                    trigger.cancel();
                }
            },
        )
        .await;

        assert_eq!(outcome, RetryOutcome::Cancelled { attempts: 2 });
    }
}
