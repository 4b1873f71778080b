use std::future::Future;

use tokio::time::{sleep, Duration};
use tracing::warn;

/// Runs `f` until it succeeds, `should_retry` rejects the error, or
/// `retries` extra attempts have been spent
///
/// The delay grows linearly: `delay * attempt`.
pub async fn with_retry<F, Fut, T, E, P>(
    f: F,
    retries: u32,
    delay: Duration,
    should_retry: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= retries || !should_retry(&e) {
                    return Err(e);
                }
                attempts += 1;
                warn!(attempt = attempts, retries, error = %e, "Retrying after transient failure");
                sleep(delay * attempts).await;
            }
        }
    }
}
