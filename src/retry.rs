//! Backoff arithmetic for retried fetches
//!
//! Attempt indices are 0-based. Attempt 0 runs immediately; attempt `i >= 1`
//! waits `base_delay * 2^i`, capped at `max_delay` if configured, optionally
//! with jitter.
//! With the default one-second base this yields no delay, then 2s, then 4s.

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Delay to sleep before attempt `attempt`, without jitter
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    // 2^attempt saturates instead of overflowing for absurd attempt counts
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    let delay = config
        .base_delay
        .checked_mul(factor)
        .unwrap_or(Duration::MAX);
    match config.max_delay {
        Some(cap) => delay.min(cap),
        None => delay,
    }
}

/// Delay actually slept before attempt `attempt`, jitter applied when enabled
pub fn effective_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let delay = backoff_delay(config, attempt);
    if config.jitter {
        add_jitter(delay)
    } else {
        delay
    }
}

/// Upper bound on the total time spent sleeping across all attempts
pub fn total_backoff(config: &RetryConfig) -> Duration {
    (0..config.max_attempts)
        .map(|attempt| backoff_delay(config, attempt))
        .fold(Duration::ZERO, Duration::saturating_add)
}

/// Add random jitter to a delay
///
/// Returns a duration between `delay` and `2 * delay`.
pub(crate) fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_ms = rng.gen_range(0..=delay.as_millis() as u64);
    delay + Duration::from_millis(jitter_ms)
}
