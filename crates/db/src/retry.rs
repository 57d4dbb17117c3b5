//! Retry with exponential backoff for transient SQLite errors.
//!
//! Concurrent drag-and-drop moves on the same board contend for the single
//! SQLite writer; SQLITE_BUSY (5) and SQLITE_LOCKED (6) usually clear after a
//! short pause.

use std::future::Future;
use std::time::Duration;

use sqlx::Error as SqlxError;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Base delay in milliseconds, doubled on every attempt.
    pub base_delay_ms: u64,
    /// Cap on the exponential growth.
    pub max_delay_ms: u64,
    /// Fraction of the delay added as jitter (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 50,
            max_delay_ms: 2000,
            jitter_factor: 0.2,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            jitter_factor: 0.2,
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        let capped_delay = base_delay.min(self.max_delay_ms);

        let jitter_range = (capped_delay as f64 * self.jitter_factor) as u64;
        let jitter = if jitter_range > 0 {
            // Cheap pseudo-random source, good enough to spread out retries
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos() as u64;
            now % jitter_range
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }
}

/// Whether `e` is a transient SQLite error worth retrying.
///
/// Retryable codes: 5 (SQLITE_BUSY), 6 (SQLITE_LOCKED), 10 (SQLITE_IOERR) and the
/// extended IOERR codes (`code & 0xFF == 10`, e.g. 522).
pub fn is_retryable_error(e: &SqlxError) -> bool {
    let SqlxError::Database(db_err) = e else {
        return false;
    };
    let Some(code) = db_err.code() else {
        return false;
    };
    match code.as_ref() {
        "5" | "6" | "10" => true,
        other => other
            .parse::<u32>()
            .is_ok_and(|n| n > 10 && (n & 0xFF) == 10),
    }
}

/// Run `f`, retrying transient failures per `config`.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, SqlxError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SqlxError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if is_retryable_error(&e) && attempt < config.max_retries => {
                let delay = config.calculate_delay(attempt);

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "Transient SQLite error, retrying with backoff"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if attempt > 0 {
                    tracing::error!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        error = ?e,
                        "Database operation failed after all retries"
                    );
                }
                return Err(e);
            }
        }
    }
}
