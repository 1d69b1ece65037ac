//! Bounded retry for transient oracle failures.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::LlmError;

const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Whether a failure is worth retrying. Rate limits and transport failures
/// are; malformed responses and timeouts are not.
pub(crate) fn is_transient(err: &LlmError) -> bool {
    matches!(
        err,
        LlmError::RateLimited { .. } | LlmError::RequestFailed { .. }
    )
}

/// Run `op` up to `1 + retries` times, backing off between attempts.
///
/// Honors a provider-supplied `retry_after` when present; otherwise uses
/// exponential backoff with jitter.
pub(crate) async fn with_retry<F, Fut, T>(retries: u32, op: F) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && is_transient(&err) => {
                let backoff = match err {
                    LlmError::RateLimited {
                        retry_after: Some(after),
                        ..
                    } => after,
                    _ => {
                        let exp = BASE_BACKOFF * 2u32.saturating_pow(attempt);
                        let jitter = rand::thread_rng().gen_range(0..250);
                        exp + Duration::from_millis(jitter)
                    }
                };
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient oracle failure, retrying: {err}"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
