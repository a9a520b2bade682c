//! Retry policy for per-object and per-row operations

use adrev_common::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

/// How many times a failed transport operation is re-attempted
///
/// The default is zero: ingestion is best-effort and a failed row or file is
/// logged and skipped. Decode errors are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self { max_retries: 0 }
    }

    pub const fn with_retries(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total attempts, including the first
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `op` until it succeeds, fails with a non-transport error, or runs out of attempts
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transport() && attempt < self.attempts() => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.attempts(),
                        error = %e,
                        "Retrying after transport error"
                    );
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adrev_common::AdrevError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_default_policy_makes_one_attempt() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("upsert", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AdrevError::transport("timeout"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(policy, RetryPolicy::none());
    }

    #[tokio::test]
    async fn test_retries_transport_errors_until_success() {
        let policy = RetryPolicy::with_retries(2);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("download", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AdrevError::transport("connection reset"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy::with_retries(2);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("download", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AdrevError::transport("connection reset"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_decode_errors_are_not_retried() {
        let policy = RetryPolicy::with_retries(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run("upsert", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AdrevError::decode("bad date"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
