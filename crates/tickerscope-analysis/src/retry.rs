//! Retry with exponential back-off for ticker lookups.
//!
//! Lookups run inside a request deadline, so the back-off is capped by
//! configuration rather than by a fixed ceiling. The default makes zero
//! retries: every name is looked up at most once per request.

use std::future::Future;
use std::time::Duration;

use crate::error::LookupError;

/// Delay schedule between lookup attempts.
///
/// Retry `n` (1-based) waits between half and all of
/// `min(base_ms × 2ⁿ⁻¹, max_delay_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_delay_ms: u64,
}

impl Backoff {
    #[must_use]
    pub fn new(base_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_ms,
            max_delay_ms,
        }
    }

    /// Upper bound of the wait before retry `attempt`.
    fn ceiling_ms(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.base_ms.saturating_mul(factor).min(self.max_delay_ms)
    }

    /// Wait before retry `attempt`: the upper half of the ceiling, randomised
    /// so concurrent lookups that failed together do not retry together.
    fn delay_for(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling_ms(attempt);
        let floor = ceiling / 2;
        Duration::from_millis(floor + rand::random_range(0..=ceiling - floor))
    }
}

/// Transient lookup failures: timeouts, refused connections, 429 and 5xx.
pub(crate) fn is_retriable(err: &LookupError) -> bool {
    match err {
        LookupError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.status()
                    .is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
        }
        LookupError::Status(code) => *code == 429 || (500..600).contains(code),
        LookupError::Deserialize { .. } | LookupError::InvalidBaseUrl(_) => false,
    }
}

/// Runs `lookup` once, then up to `max_retries` more times while it keeps
/// failing transiently. The last error is returned when retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff: Backoff,
    mut lookup: F,
) -> Result<T, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LookupError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match lookup().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry == max_retries || !is_retriable(&err) {
            return Err(err);
        }

        retry += 1;
        let delay = backoff.delay_for(retry);
        tracing::warn!(retry, max_retries, ?delay, error = %err, "ticker lookup failed transiently");
        tokio::time::sleep(delay).await;
    }
}
