// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending records: the items carried by the offline sync queue.
//!
//! A pending record is one mutation awaiting delivery to the remote record
//! store. Records are immutable in identity: an edit to the same logical
//! record is a brand-new record under a new idempotency key, never an
//! in-place change to an already-queued one.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backoff::next_attempt_at;
use crate::error::{Error, Result};
use crate::key::record_key;

/// Discriminator for the mutation type carried by a pending record.
///
/// Only observations flow through the queue today; the enum is
/// non-exhaustive so future kinds can be added without breaking callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RecordKind {
    /// A set of caregiver-recorded measurements for one subject.
    Observation,
}

impl RecordKind {
    /// Returns the canonical string form used in keys and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Observation => "observation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "observation" => Ok(RecordKind::Observation),
            other => Err(Error::InvalidKind(other.to_string())),
        }
    }
}

/// Caller-supplied fields for a new pending record.
///
/// The UI fills one of these per submission; the sync engine derives the
/// idempotency key and retry bookkeeping from it.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    /// The entity the observation is about.
    pub subject_id: String,
    pub kind: RecordKind,
    /// Sparse named measurements; an absent name means "not measured".
    pub measurements: BTreeMap<String, f64>,
    pub memo: String,
    pub tags: BTreeSet<String>,
    /// When the submission was authored, millisecond precision.
    pub submitted_at: DateTime<Utc>,
    /// IANA time zone the submission was authored in.
    pub time_zone: String,
    /// Which UI surface or call site created the record.
    pub origin: String,
}

/// One pending mutation awaiting delivery to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    /// Globally unique identity of this submission; immutable once created.
    pub key: String,
    pub kind: RecordKind,
    pub subject_id: String,
    /// Sparse named measurements; an absent name means "not measured",
    /// never zero.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub measurements: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    pub submitted_at: DateTime<Utc>,
    pub time_zone: String,
    /// Provenance tag; diagnostics only, and a key discriminator.
    pub origin: String,
    /// Number of failed flush attempts so far.
    #[serde(default)]
    pub retry_count: u32,
    /// Most recent failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When absent, the record is immediately eligible for flushing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl PendingRecord {
    /// Creates a pending record from a draft, deriving its idempotency key.
    ///
    /// Rejects drafts with a blank `subject_id` or `origin`; both feed the
    /// key, so an empty one would collapse distinct submissions.
    pub fn new(draft: RecordDraft) -> Result<Self> {
        if draft.subject_id.trim().is_empty() {
            return Err(Error::InvalidRecord("subject_id cannot be empty".to_string()));
        }
        if draft.origin.trim().is_empty() {
            return Err(Error::InvalidRecord("origin cannot be empty".to_string()));
        }

        let key = record_key(&draft.subject_id, draft.kind, draft.submitted_at, &draft.origin);

        Ok(PendingRecord {
            key,
            kind: draft.kind,
            subject_id: draft.subject_id,
            measurements: draft.measurements,
            memo: draft.memo,
            tags: draft.tags,
            submitted_at: draft.submitted_at,
            time_zone: draft.time_zone,
            origin: draft.origin,
            retry_count: 0,
            last_error: None,
            next_attempt_at: None,
        })
    }

    /// Returns true when the record is eligible for the current flush cycle.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_attempt_at {
            None => true,
            Some(at) => at <= now,
        }
    }

    /// Records a failed delivery attempt and schedules the next one.
    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.retry_count += 1;
        self.last_error = Some(error.into());
        self.next_attempt_at = Some(next_attempt_at(now, self.retry_count));
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
