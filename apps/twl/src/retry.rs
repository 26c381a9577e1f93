//! Fixed-delay retry policy.
//!
//! Release asset hosting fails either with short blips or with outages that
//! outlast a CLI invocation, so the policy waits the same delay before every
//! retry instead of backing off exponentially. The sleep function is passed in
//! so tests do not depend on real time.

use std::future::Future;
use std::time::Duration;

/// Maximum number of download attempts.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before each attempt after the first.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay to wait before `attempt` (1-based), or `None` if the
    /// attempt is beyond `max_attempts`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Option<Duration> {
        match attempt {
            0 => None,
            1 => Some(Duration::ZERO),
            n if n <= self.max_attempts => Some(self.delay),
            _ => None,
        }
    }
}

/// Outcome of a retried operation that never succeeded.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error of the last attempt.
    pub last_error: E,
}

/// Runs `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. `sleep` is awaited before every
/// attempt with a non-zero delay and receives that attempt's number. The first
/// attempt always runs, so a policy with `max_attempts: 0` behaves like 1.
///
/// # Errors
///
/// Returns [`Exhausted`] with the last error once every attempt has failed.
pub async fn retry_with_policy<T, E, Op, OpFut, Sleep, SleepFut>(
    policy: &RetryPolicy,
    mut sleep: Sleep,
    mut op: Op,
) -> Result<T, Exhausted<E>>
where
    Op: FnMut(u32) -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Sleep: FnMut(u32, Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.delay_before(attempt + 1) {
                Some(delay) => {
                    attempt += 1;
                    if !delay.is_zero() {
                        sleep(attempt, delay).await;
                    }
                }
                None => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            },
        }
    }
}
