//! Caller-level retry for transient collaborator failures.

use insight_core::AppResult;
use std::future::Future;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
pub const INITIAL_BACKOFF_MS: u64 = 200;

/// Run `op`, retrying `EmbeddingUnavailable` and `AnswererUnavailable`
/// failures with exponential backoff. Any other error returns immediately.
pub async fn with_retry<T, F, Fut>(mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                tracing::warn!(
                    "{} (attempt {}/{}), retrying in {}ms",
                    e,
                    attempt,
                    MAX_ATTEMPTS,
                    backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
