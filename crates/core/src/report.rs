// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Flush-cycle reporting for the UI and telemetry.

use serde::{Deserialize, Serialize};

use crate::record::RecordKind;

/// Outcome of one eligible record in a flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushStatus {
    /// Applied by the remote store (freshly created or already known).
    Sent,
    /// Rejected or unanswered; retained for a later cycle.
    Failed,
}

impl FlushStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushStatus::Sent => "sent",
            FlushStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FlushStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One eligible record's outcome, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushEntry {
    pub subject_id: String,
    pub status: FlushStatus,
    pub kind: RecordKind,
}

/// Result of one flush cycle.
///
/// `total_count` counts the records that were eligible this cycle; zero
/// means no network call was made. Deferred records contribute only to
/// `remaining`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushSummary {
    /// Records the remote store applied this cycle.
    pub sent: usize,
    /// Records that failed this cycle and re-entered backoff.
    pub error_count: usize,
    /// Records that were eligible (due) this cycle.
    pub total_count: usize,
    /// Queue size immediately after this cycle.
    pub remaining: usize,
    /// One entry per eligible record, in submission order.
    pub entries: Vec<FlushEntry>,
}

impl FlushSummary {
    /// Summary for a cycle with no eligible records.
    pub fn empty(remaining: usize) -> Self {
        FlushSummary {
            sent: 0,
            error_count: 0,
            total_count: 0,
            remaining,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
