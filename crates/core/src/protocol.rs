// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the batched record upsert call.
//!
//! The gateway consumes [`UploadEnvelope`]s and reports one
//! [`UpsertResult`] per envelope, matched by idempotency key. Responses are
//! not required to preserve submission order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{PendingRecord, RecordKind};

/// Wire-shaped wrapper around one pending record.
///
/// Carries the identity and content of the submission but none of the
/// local retry bookkeeping, which never leaves the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEnvelope {
    pub key: String,
    pub kind: RecordKind,
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub measurements: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    pub submitted_at: DateTime<Utc>,
    pub time_zone: String,
    pub origin: String,
}

impl UploadEnvelope {
    /// Builds the envelope for one pending record.
    pub fn from_record(record: &PendingRecord) -> Self {
        UploadEnvelope {
            key: record.key.clone(),
            kind: record.kind,
            subject_id: record.subject_id.clone(),
            measurements: record.measurements.clone(),
            memo: record.memo.clone(),
            tags: record.tags.clone(),
            submitted_at: record.submitted_at,
            time_zone: record.time_zone.clone(),
            origin: record.origin.clone(),
        }
    }
}

/// Per-item outcome of a batch upsert, keyed by idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertResult {
    pub key: String,
    /// Whether the remote store applied (or had already applied) the record.
    pub ok: bool,
    /// Remote identifier of the stored record, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// True when a new remote record was created, false when the key had
    /// already been applied. Success either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    /// Delivery attempts the remote side reports for this key.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpsertResult {
    /// Successful outcome for a key.
    pub fn applied(key: impl Into<String>, record_id: impl Into<String>, created: bool) -> Self {
        UpsertResult {
            key: key.into(),
            ok: true,
            record_id: Some(record_id.into()),
            created: Some(created),
            attempts: 1,
            error: None,
        }
    }

    /// Failed outcome for a key.
    pub fn rejected(key: impl Into<String>, error: impl Into<String>) -> Self {
        UpsertResult {
            key: key.into(),
            ok: false,
            record_id: None,
            created: None,
            attempts: 1,
            error: Some(error.into()),
        }
    }
}

/// Request body of the batch upsert call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpsertRequest {
    pub records: Vec<UploadEnvelope>,
}

/// Response body of the batch upsert call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUpsertResponse {
    pub results: Vec<UpsertResult>,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
