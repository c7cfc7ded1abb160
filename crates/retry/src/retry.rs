use std::future::Future;

use pageloom_core::{ClassifiedError, ErrorCause, RetryParam, RetryResult, Severity};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::backoff::exponential_backoff_delay;
use crate::cancel::CancelToken;

/// Wraps a task's own error with retry-wrapper-level outcomes that have no
/// counterpart in the task's error type: a refusal to run at all, or an
/// exhausted attempt budget.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E: std::error::Error> {
    #[error("max_attempts < 1: task never invoked")]
    ZeroAttempts,
    #[error("exhausted {attempts} attempt(s), last error: {last}")]
    Exhausted { attempts: u32, last: String },
    #[error(transparent)]
    Task(#[from] E),
}

impl<E: ClassifiedError> ClassifiedError for RetryError<E> {
    fn is_retryable(&self) -> bool {
        match self {
            // Exhaustion is itself reported as retryable: a caller one level
            // up (e.g. a scheduler retrying a whole page) may still want to
            // treat "retries ran out" as recoverable at its own scope.
            RetryError::ZeroAttempts => false,
            RetryError::Exhausted { .. } => true,
            RetryError::Task(e) => e.is_retryable(),
        }
    }

    fn cause(&self) -> ErrorCause {
        match self {
            RetryError::ZeroAttempts => ErrorCause::InvariantViolation,
            RetryError::Exhausted { .. } => ErrorCause::RetryFailure,
            RetryError::Task(e) => e.cause(),
        }
    }

    fn severity(&self) -> Severity {
        match self {
            RetryError::ZeroAttempts => Severity::Fatal,
            RetryError::Exhausted { .. } => Severity::Recoverable,
            RetryError::Task(e) => e.severity(),
        }
    }
}

/// Runs `task` up to `param.max_attempts` times, sleeping with exponential
/// backoff plus jitter between attempts. `task` receives the 1-based attempt
/// number it is being invoked as.
///
/// - `max_attempts < 1` fails without invoking `task` at all, `attempts == 0`.
/// - A non-retryable task error short-circuits immediately; its `attempts`
///   reflects exactly how many invocations actually happened.
/// - If every attempt fails but the last error was retryable, the result is
///   an `Exhausted` error rather than the bare last error, so callers can
///   tell "ran out of retries" apart from "failed on the first try".
/// - Honors `cancel`: a cancellation signal received while sleeping between
///   attempts ends the loop immediately, reporting the attempts made so far.
pub async fn retry<T, E, F, Fut>(
    param: &RetryParam,
    cancel: &CancelToken,
    mut task: F,
) -> RetryResult<T, RetryError<E>>
where
    E: ClassifiedError,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if param.max_attempts < 1 {
        return RetryResult::err(RetryError::ZeroAttempts, 0);
    }

    let mut rng = StdRng::seed_from_u64(param.random_seed);
    let mut attempts_made = 0u32;
    let mut last_err: Option<E> = None;

    for attempt in 1..=param.max_attempts {
        attempts_made = attempt;
        match task(attempt).await {
            Ok(value) => return RetryResult::ok(value, attempts_made),
            Err(err) => {
                if !err.is_retryable() {
                    return RetryResult::err(RetryError::Task(err), attempts_made);
                }
                last_err = Some(err);

                if attempt < param.max_attempts {
                    let delay =
                        exponential_backoff_delay(attempt, param.jitter, &mut rng, &param.backoff);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }
    }

    let last = last_err
        .map(|e| e.message())
        .unwrap_or_else(|| "cancelled before any attempt completed".to_string());
    RetryResult::err(
        RetryError::Exhausted {
            attempts: attempts_made,
            last,
        },
        attempts_made,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use pageloom_core::BackoffParam;

    use super::*;
    use crate::cancel::{cancel_pair, never_cancelled};

    #[derive(Debug, thiserror::Error)]
    #[error("boom: {0}")]
    struct FlakyError(String, bool);

    impl ClassifiedError for FlakyError {
        fn is_retryable(&self) -> bool {
            self.1
        }
        fn cause(&self) -> ErrorCause {
            ErrorCause::NetworkFailure
        }
    }

    fn fast_param(max_attempts: u32) -> RetryParam {
        RetryParam {
            base_delay: Duration::from_millis(1),
            jitter: Duration::ZERO,
            random_seed: 0,
            max_attempts,
            backoff: BackoffParam {
                initial: Duration::from_millis(1),
                multiplier: 1.0,
                max: Duration::from_millis(5),
            },
        }
    }

    #[tokio::test]
    async fn zero_attempts_never_calls_task() {
        let calls = AtomicU32::new(0);
        let param = fast_param(0);
        let result = retry(&param, &never_cancelled(), |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FlakyError>(()) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.attempts, 0);
        assert!(matches!(result.outcome, Err(RetryError::ZeroAttempts)));
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let param = fast_param(3);
        let result = retry(&param, &never_cancelled(), |attempt| async move {
            Ok::<_, FlakyError>(attempt)
        })
        .await;
        assert_eq!(result.attempts, 1);
        assert_eq!(result.outcome.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_retryable_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let param = fast_param(5);
        let result = retry(&param, &never_cancelled(), |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FlakyError("fatal".into(), false)) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.attempts, 1);
        assert!(matches!(result.outcome, Err(RetryError::Task(_))));
    }

    #[tokio::test]
    async fn exhausts_all_attempts_then_wraps() {
        let calls = AtomicU32::new(0);
        let param = fast_param(3);
        let result = retry(&param, &never_cancelled(), |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FlakyError("down".into(), true)) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.attempts, 3);
        match result.outcome {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.contains("down"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert!(matches!(
            result.outcome,
            Err(ref e) if e.is_retryable()
        ));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let param = fast_param(5);
        let result = retry(&param, &never_cancelled(), |attempt| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(FlakyError("retry me".into(), true))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.attempts, 3);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop_mid_sleep() {
        let (handle, token) = cancel_pair();
        let param = RetryParam {
            base_delay: Duration::from_millis(1),
            jitter: Duration::ZERO,
            random_seed: 0,
            max_attempts: 10,
            backoff: BackoffParam {
                initial: Duration::from_secs(30),
                multiplier: 1.0,
                max: Duration::from_secs(30),
            },
        };
        let calls = AtomicU32::new(0);
        let fut = retry(&param, &token, |_attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FlakyError("slow".into(), true)) }
        });
        tokio::pin!(fut);
        // Let the first attempt run and enter its 30s sleep, then cancel.
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        let result = fut.await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn deterministic_delay_sequence_for_same_seed() {
        let param = fast_param(4);
        let calls_a = AtomicU32::new(0);
        let start_a = tokio::time::Instant::now();
        let _ = retry(&param, &never_cancelled(), |_attempt| {
            calls_a.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FlakyError("x".into(), true)) }
        })
        .await;
        let elapsed_a = start_a.elapsed();

        let calls_b = AtomicU32::new(0);
        let start_b = tokio::time::Instant::now();
        let _ = retry(&param, &never_cancelled(), |_attempt| {
            calls_b.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(FlakyError("x".into(), true)) }
        })
        .await;
        let elapsed_b = start_b.elapsed();

        // Same seed and same backoff shape: wall-clock sleep totals line up
        // within a small scheduling margin.
        let diff = elapsed_a.as_millis().abs_diff(elapsed_b.as_millis());
        assert!(diff < 20, "expected near-identical timing, diff={diff}ms");
    }
}
