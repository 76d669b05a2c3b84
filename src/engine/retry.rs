//! 有限次重试
//!
//! 把"最多尝试 N 次、每次失败后线性退避"的逻辑从业务代码里拿出来，
//! 任意异步操作都可以套用。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// 重试策略：第 n 次失败后等待 `n * backoff_step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub const fn linear(max_attempts: u32, backoff_step: Duration) -> Self {
        Self {
            max_attempts,
            backoff_step,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// 按策略执行 `op`，返回第一次成功的结果或最后一次的错误
///
/// `op` 收到当前尝试序号（从 1 开始）。
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("⚠️ {} 失败 (尝试 {}/{}): {}", label, attempt, max_attempts, e);
                if attempt >= max_attempts {
                    return Err(e);
                }
                sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<&str, String> =
            retry_with_backoff(&RetryPolicy::default(), "test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("fail {}", attempt))
                    } else {
                        Ok("third")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("third"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> =
            retry_with_backoff(&RetryPolicy::default(), "test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("fail {}", attempt)) }
            })
            .await;

        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let started = Instant::now();
        let result: Result<u8, String> =
            retry_with_backoff(&RetryPolicy::default(), "test", |_| async { Ok(1) }).await;

        assert_eq!(result, Ok(1));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::linear(0, Duration::from_millis(10));

        let _: Result<(), String> = retry_with_backoff(&policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("nope".to_string()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
