// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Clock seam for the sync core.
//!
//! Every component is pure given a clock; injecting one keeps the flush
//! scheduling fully testable without real sleeps.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait ClockSource: Send + Sync {
    /// Returns the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock backed by `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now_utc(&self) -> DateTime<Utc> {
        (*self).now_utc()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
