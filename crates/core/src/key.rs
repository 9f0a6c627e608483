// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic idempotency keys for pending records.
//!
//! The key is what lets the remote store treat repeated delivery of the
//! same submission as a single effect. Two edits to the same subject within
//! the same clock-minute stay distinct submissions because the authoring
//! timestamp enters the key at millisecond resolution.

use chrono::{DateTime, Utc};

use crate::record::RecordKind;

/// Builds the idempotency key for one submission.
///
/// Deterministic join of the four identity fields:
/// `subject_id:kind:millis:origin`. Identical inputs always yield the same
/// key; inputs differing in any field (including the millisecond timestamp
/// or the origin tag) yield different keys. Pure, no failure mode.
pub fn record_key(
    subject_id: &str,
    kind: RecordKind,
    submitted_at: DateTime<Utc>,
    origin: &str,
) -> String {
    format!(
        "{}:{}:{}:{}",
        subject_id,
        kind.as_str(),
        submitted_at.timestamp_millis(),
        origin
    )
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
