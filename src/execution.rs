//! Deadline-bounded execution of blocking work.
//!
//! Mask computation cannot be interrupted once started. When the deadline
//! fires the caller gets [`ProcessError::TimedOut`] immediately, while the
//! job keeps running on the blocking pool until it finishes on its own and
//! its result is dropped. A job still queued when its deadline fires is
//! skipped without running. Abandoned jobs still hold CPU and memory; they are
//! counted so the leak is observable, but their number is not capped.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProcessError;

// Queued or running
const PENDING: u8 = 0;
const FINISHED: u8 = 1;
const ABANDONED: u8 = 2;

/// Runs blocking jobs off the async executor with a wall-clock deadline
#[derive(Debug, Clone)]
pub struct BoundedExecutor {
    deadline: Duration,
    abandoned: Arc<AtomicUsize>,
}

impl BoundedExecutor {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            abandoned: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Jobs that timed out and have not finished yet
    pub fn abandoned_jobs(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Runs `job` on the blocking pool and waits at most the deadline for it
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// * `ProcessError::TimedOut` - When the deadline elapses first
    /// * `ProcessError::Worker` - When the job panics
    /// * Any error returned by the job itself, converted into `ProcessError`
    pub async fn run<F, T, E>(&self, job: F) -> Result<T, ProcessError>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<ProcessError> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(PENDING));
        let job_state = Arc::clone(&state);
        let abandoned = Arc::clone(&self.abandoned);

        let handle = tokio::task::spawn_blocking(move || {
            // Still queued when the deadline fired: nobody is waiting for it
            if job_state.load(Ordering::SeqCst) == ABANDONED {
                abandoned.fetch_sub(1, Ordering::SeqCst);
                tracing::debug!("Abandoned job skipped before it started");
                return None;
            }
            let result = job();
            if job_state.swap(FINISHED, Ordering::SeqCst) == ABANDONED {
                abandoned.fetch_sub(1, Ordering::SeqCst);
                tracing::debug!("Abandoned job finished, result discarded");
            }
            Some(result)
        });

        match tokio::time::timeout(self.deadline, handle).await {
            Ok(Ok(Some(result))) => result.map_err(Into::into),
            Ok(Ok(None)) => Err(ProcessError::Worker(
                "job skipped after being abandoned".to_string(),
            )),
            Ok(Err(join_error)) => {
                tracing::error!("Processing worker failed: {join_error}");
                Err(ProcessError::Worker(join_error.to_string()))
            }
            Err(_) => {
                // Count before publishing the state so the job can never
                // decrement ahead of this increment.
                self.abandoned.fetch_add(1, Ordering::SeqCst);
                if state
                    .compare_exchange(PENDING, ABANDONED, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    self.abandoned.fetch_sub(1, Ordering::SeqCst);
                }
                tracing::warn!(
                    deadline = ?self.deadline,
                    abandoned = self.abandoned_jobs(),
                    "Processing timed out; job left running in the background"
                );
                Err(ProcessError::TimedOut {
                    deadline: self.deadline,
                })
            }
        }
    }
}

/// Runs `job` with the given deadline on a one-off executor
///
/// # Errors
///
/// See [`BoundedExecutor::run`].
pub async fn run_with_deadline<F, T, E>(job: F, deadline: Duration) -> Result<T, ProcessError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ProcessError> + Send + 'static,
{
    BoundedExecutor::new(deadline).run(job).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[tokio::test]
    async fn completed_job_returns_its_value() {
        let result = run_with_deadline(|| Ok::<_, ProcessError>(42), Duration::from_secs(5)).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn job_errors_are_converted() {
        let result = run_with_deadline(
            || Err::<(), _>(ProviderError::Unavailable("no model".into())),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(
            result,
            Err(ProcessError::ModelUnavailable(ProviderError::Unavailable(
                "no model".into()
            )))
        );
    }

    #[tokio::test]
    async fn panicking_job_is_a_worker_error() {
        let result = run_with_deadline(
            || -> Result<(), ProcessError> { panic!("inference crashed") },
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(ProcessError::Worker(_))));
    }

    #[tokio::test]
    async fn abandoned_job_is_counted_until_it_finishes() {
        let executor = BoundedExecutor::new(Duration::from_millis(20));
        let (release, gate) = std::sync::mpsc::channel::<()>();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();

        let result = executor
            .run(move || {
                let _ = gate.recv();
                let _ = done_tx.send(());
                Ok::<_, ProcessError>(())
            })
            .await;

        assert_eq!(
            result,
            Err(ProcessError::TimedOut {
                deadline: Duration::from_millis(20)
            })
        );
        assert_eq!(executor.abandoned_jobs(), 1);

        release.send(()).unwrap();
        done_rx.await.unwrap();
        // The decrement happens right after the job body returns
        for _ in 0..100 {
            if executor.abandoned_jobs() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(executor.abandoned_jobs(), 0);
    }

    #[test]
    fn job_queued_past_its_deadline_never_runs() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .max_blocking_threads(1)
            .build()
            .unwrap();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));

        runtime.block_on(async {
            let executor = BoundedExecutor::new(Duration::from_millis(50));
            let (release, gate) = std::sync::mpsc::channel::<()>();

            // Occupies the only blocking thread
            let first = executor
                .run(move || {
                    let _ = gate.recv();
                    Ok::<_, ProcessError>(())
                })
                .await;
            assert!(matches!(first, Err(ProcessError::TimedOut { .. })));

            let flag = Arc::clone(&ran);
            let second = executor
                .run(move || {
                    flag.store(true, Ordering::SeqCst);
                    Ok::<_, ProcessError>(())
                })
                .await;
            assert!(matches!(second, Err(ProcessError::TimedOut { .. })));
            assert_eq!(executor.abandoned_jobs(), 2);

            release.send(()).unwrap();
            for _ in 0..200 {
                if executor.abandoned_jobs() == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert_eq!(executor.abandoned_jobs(), 0);
        });

        assert!(!ran.load(Ordering::SeqCst));
    }
}
