// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for the flush cycle of the sync engine.
//!
//! These tests drive the public `tend-sync` API end to end with a scripted
//! gateway: due-item selection, batched submission, key-based
//! reconciliation, backoff scheduling, and summary reporting.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use tend_core::{PendingRecord, RecordDraft, RecordKind, UploadEnvelope, UpsertResult};
use tend_sync::{GatewayResult, RecordGateway, SyncConfig, SyncEngine};

/// Gateway double: records batches, plays scripted outcomes, and applies
/// everything as freshly created when unscripted.
struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<GatewayResult<Vec<UpsertResult>>>>>,
    batches: Arc<Mutex<Vec<Vec<UploadEnvelope>>>>,
}

impl ScriptedGateway {
    fn new() -> Self {
        ScriptedGateway {
            script: Arc::new(Mutex::new(VecDeque::new())),
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, outcome: GatewayResult<Vec<UpsertResult>>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn batches(&self) -> Vec<Vec<UploadEnvelope>> {
        self.batches.lock().unwrap().clone()
    }
}

impl RecordGateway for ScriptedGateway {
    fn upsert(
        &mut self,
        envelopes: Vec<UploadEnvelope>,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Vec<UpsertResult>>> + Send + '_>> {
        let script = Arc::clone(&self.script);
        let batches = Arc::clone(&self.batches);
        Box::pin(async move {
            batches.lock().unwrap().push(envelopes.clone());
            match script.lock().unwrap().pop_front() {
                Some(outcome) => outcome,
                None => Ok(envelopes
                    .iter()
                    .map(|e| UpsertResult::applied(e.key.clone(), format!("srv-{}", e.key), true))
                    .collect()),
            }
        })
    }
}

fn ts(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

fn draft(subject_id: &str, millis: i64, memo: &str) -> RecordDraft {
    let mut measurements = BTreeMap::new();
    measurements.insert("temperature".to_string(), 36.8);

    RecordDraft {
        subject_id: subject_id.to_string(),
        kind: RecordKind::Observation,
        measurements,
        memo: memo.to_string(),
        tags: BTreeSet::new(),
        submitted_at: ts(millis),
        time_zone: "Asia/Tokyo".to_string(),
        origin: "observation-form".to_string(),
    }
}

fn open_engine(temp: &TempDir) -> SyncEngine {
    SyncEngine::open(&temp.path().join("queue.jsonl"), SyncConfig::default()).unwrap()
}

// =============================================================================
// Empty-due cycles
// =============================================================================

#[tokio::test]
async fn empty_queue_flush_never_touches_the_gateway() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    let summary = engine.flush(&mut gateway, ts(5000)).await.unwrap();

    assert_eq!(gateway.call_count(), 0);
    assert_eq!(summary.total_count, 0);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.error_count, 0);
    assert!(summary.entries.is_empty());
}

// =============================================================================
// Idempotency keys
// =============================================================================

#[tokio::test]
async fn edits_one_second_apart_are_distinct_submissions() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    // Same subject, same kind, 1s apart: the caregiver corrected the memo
    engine
        .enqueue(draft("resident-17", 1_700_000_000_000, "temp 36.8"))
        .await
        .unwrap();
    engine
        .enqueue(draft("resident-17", 1_700_000_001_000, "temp 36.8, after meal"))
        .await
        .unwrap();

    let pending = engine.pending().await.unwrap();
    assert_ne!(pending[0].key, pending[1].key);

    let summary = engine.flush(&mut gateway, ts(1_700_000_002_000)).await.unwrap();

    // Both delivered in one batch; the later submission is last, so its
    // memo is what the remote upsert leaves in place
    assert_eq!(summary.sent, 2);
    let batch = &gateway.batches()[0];
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].memo, "temp 36.8, after meal");
}

// =============================================================================
// Success and failure reconciliation
// =============================================================================

#[tokio::test]
async fn success_removes_the_record() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    engine
        .enqueue(draft("resident-17", 1000, "steady"))
        .await
        .unwrap();

    let summary = engine.flush(&mut gateway, ts(5000)).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.remaining, 0);
    assert_eq!(engine.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn failure_retains_the_record_with_backoff() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    engine
        .enqueue(draft("resident-17", 1000, "steady"))
        .await
        .unwrap();
    let key = engine.pending().await.unwrap()[0].key.clone();
    gateway.push(Ok(vec![UpsertResult::rejected(&key, "store unavailable")]));

    let now = ts(5000);
    let summary = engine.flush(&mut gateway, now).await.unwrap();

    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.remaining, 1);

    let pending = engine.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].retry_count, 1);
    let delta = (pending[0].next_attempt_at.unwrap() - now).num_milliseconds();
    assert!((2000..2050).contains(&delta), "delta was {delta}");
}

#[tokio::test]
async fn backoff_escalates_across_three_failures() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    engine
        .enqueue(draft("resident-17", 1000, "steady"))
        .await
        .unwrap();
    let key = engine.pending().await.unwrap()[0].key.clone();

    let mut now = ts(100_000);
    for expected in [2000i64, 4000, 8000] {
        gateway.push(Ok(vec![UpsertResult::rejected(&key, "still down")]));
        engine.flush(&mut gateway, now).await.unwrap();

        let record = engine.pending().await.unwrap().remove(0);
        let delta = (record.next_attempt_at.unwrap() - now).num_milliseconds();
        assert_eq!(delta, expected);

        now = record.next_attempt_at.unwrap();
    }

    assert_eq!(engine.pending().await.unwrap()[0].retry_count, 3);
}

// =============================================================================
// Deferred records and re-flush
// =============================================================================

#[tokio::test]
async fn premature_reflush_is_a_noop_until_the_delay_elapses() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    engine
        .enqueue(draft("resident-17", 1000, "steady"))
        .await
        .unwrap();
    let key = engine.pending().await.unwrap()[0].key.clone();
    gateway.push(Ok(vec![UpsertResult::rejected(&key, "store unavailable")]));

    let now = ts(5000);
    engine.flush(&mut gateway, now).await.unwrap();
    let deferred: Vec<PendingRecord> = engine.pending().await.unwrap();

    // 1999 ms later: not due yet, gateway untouched, record untouched
    let early = engine
        .flush(&mut gateway, now + Duration::milliseconds(1999))
        .await
        .unwrap();
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(early.total_count, 0);
    assert_eq!(engine.pending().await.unwrap(), deferred);

    // 2000 ms later: due again, delivered, queue drained
    let retry = engine
        .flush(&mut gateway, now + Duration::milliseconds(2000))
        .await
        .unwrap();
    assert_eq!(gateway.call_count(), 2);
    assert_eq!(retry.sent, 1);
    assert_eq!(engine.pending_count().await.unwrap(), 0);
}

// =============================================================================
// Batching and duplicate safety
// =============================================================================

#[tokio::test]
async fn many_due_records_produce_exactly_one_gateway_call() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    for i in 0..5 {
        engine
            .enqueue(draft(&format!("resident-{i}"), 1000 + i, "round"))
            .await
            .unwrap();
    }

    let summary = engine.flush(&mut gateway, ts(10_000)).await.unwrap();

    assert_eq!(gateway.call_count(), 1);
    assert_eq!(gateway.batches()[0].len(), 5);
    assert_eq!(summary.sent, 5);
    assert_eq!(summary.total_count, 5);
}

#[tokio::test]
async fn already_applied_key_reports_the_same_as_fresh_creation() {
    let temp = TempDir::new().unwrap();
    let engine = open_engine(&temp);
    let mut gateway = ScriptedGateway::new();

    engine
        .enqueue(draft("resident-17", 1000, "steady"))
        .await
        .unwrap();
    engine
        .enqueue(draft("resident-18", 2000, "steady"))
        .await
        .unwrap();

    let pending = engine.pending().await.unwrap();
    gateway.push(Ok(vec![
        // The remote store had already seen the first key
        UpsertResult::applied(&pending[0].key, "srv-1", false),
        UpsertResult::applied(&pending[1].key, "srv-2", true),
    ]));

    let summary = engine.flush(&mut gateway, ts(10_000)).await.unwrap();

    assert_eq!(summary.sent, 2);
    assert_eq!(summary.error_count, 0);
    assert_eq!(engine.pending_count().await.unwrap(), 0);
}
