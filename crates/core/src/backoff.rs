// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry scheduling for failed deliveries.
//!
//! The delay doubles with every additional failure and is clamped so a
//! long-stuck record keeps retrying on a bounded cadence instead of
//! drifting out indefinitely. Records are never dropped by retry count.

use chrono::{DateTime, Duration, Utc};

/// Base delay in milliseconds; the first failure waits twice this.
pub const BASE_DELAY_MS: u64 = 1000;

/// Ceiling for the retry delay (30 minutes).
pub const MAX_RETRY_DELAY_MS: u64 = 30 * 60 * 1000;

/// Returns the delay before the next attempt after `retry_count` failures.
///
/// `BASE_DELAY_MS * 2^retry_count`, so the first, second, and third
/// failures defer a record by 2s, 4s, and 8s. Clamped at
/// [`MAX_RETRY_DELAY_MS`]. Pure and total.
pub fn retry_delay_ms(retry_count: u32) -> u64 {
    let factor = match 1u64.checked_shl(retry_count) {
        Some(f) => f,
        None => return MAX_RETRY_DELAY_MS,
    };
    std::cmp::min(BASE_DELAY_MS.saturating_mul(factor), MAX_RETRY_DELAY_MS)
}

/// Returns the wall-clock time at which a record becomes due again.
pub fn next_attempt_at(now: DateTime<Utc>, retry_count: u32) -> DateTime<Utc> {
    // CORRECTNESS: the clamp keeps the delay far below i64::MAX millis
    #[allow(clippy::cast_possible_wrap)]
    let delay = retry_delay_ms(retry_count) as i64;
    now + Duration::milliseconds(delay)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
