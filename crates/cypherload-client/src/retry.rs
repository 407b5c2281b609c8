use std::future::Future;
use std::time::Duration;

use tracing::warn;

use cypherload_core::constants::BACKOFF_CAP_SECS;

/// Backoff before the attempt after `attempt` (1-based) has failed:
/// `min(2^attempt, 30)` seconds, so 2s after the first failure, 4s after
/// the second.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(BACKOFF_CAP_SECS))
}

/// Run `operation` up to `max_attempts` times, sleeping with exponential
/// backoff between attempts. The sleep is an await point, so dropping the
/// future cancels an in-progress wait.
pub async fn run_with_backoff<T, E, F, Fut>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = backoff_delay(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
