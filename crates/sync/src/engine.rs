// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: the flush orchestrator.
//!
//! Selects due records, submits them as one batch, reconciles per-item
//! outcomes back into the durable queue, and reports a summary for the
//! caller (UI, telemetry, toast).

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use tend_core::{
    ClockSource, FlushEntry, FlushStatus, FlushSummary, PendingRecord, RecordDraft, SystemClock,
    UploadEnvelope, UpsertResult,
};

use crate::config::SyncConfig;
use crate::gateway::{GatewayError, RecordGateway};
use crate::queue::{AddOutcome, QueueError, QueueStore};

/// Error type for sync engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Queue store error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// The whole batch call failed; no record state changed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Invalid record submitted by the caller.
    #[error(transparent)]
    Record(#[from] tend_core::Error),
}

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Orchestrates flush cycles over a durable queue store.
///
/// The store sits behind a mutex held for a whole cycle: at most one flush
/// is in flight at a time, and an enqueue issued mid-cycle waits for the
/// commit, so the final snapshot replace can never lose it.
pub struct SyncEngine<C: ClockSource = SystemClock> {
    store: Mutex<QueueStore>,
    config: SyncConfig,
    clock: C,
}

impl SyncEngine<SystemClock> {
    /// Open an engine over the queue file at `path` with the system clock.
    pub fn open(path: &Path, config: SyncConfig) -> SyncResult<Self> {
        Self::with_clock(path, config, SystemClock)
    }
}

impl<C: ClockSource> SyncEngine<C> {
    /// Open an engine with a custom clock (for testing).
    pub fn with_clock(path: &Path, config: SyncConfig, clock: C) -> SyncResult<Self> {
        let store = QueueStore::open(path, config.max_queue_len)?;

        Ok(SyncEngine {
            store: Mutex::new(store),
            config,
            clock,
        })
    }

    /// Queue a new record for delivery.
    ///
    /// The record is durably persisted before this returns. `warned` in
    /// the outcome means capacity pressure dropped the oldest unsynced
    /// records to make room.
    pub async fn enqueue(&self, draft: RecordDraft) -> SyncResult<AddOutcome> {
        let record = PendingRecord::new(draft)?;

        let mut store = self.store.lock().await;
        let outcome = store.add(&record)?;

        if outcome.warned {
            tracing::warn!(
                "queue is full, oldest unsynced records were dropped (size {})",
                outcome.size
            );
        }

        Ok(outcome)
    }

    /// Snapshot of all pending records, insertion order preserved.
    pub async fn pending(&self) -> SyncResult<Vec<PendingRecord>> {
        Ok(self.store.lock().await.all()?)
    }

    /// Number of pending records.
    pub async fn pending_count(&self) -> SyncResult<usize> {
        Ok(self.store.lock().await.len()?)
    }

    /// Run one flush cycle at the engine clock's current time.
    pub async fn flush_now<G: RecordGateway>(&self, gateway: &mut G) -> SyncResult<FlushSummary> {
        let now = self.clock.now_utc();
        self.flush(gateway, now).await
    }

    /// Run one flush cycle.
    ///
    /// Due records are submitted as a single batch; a cycle with nothing
    /// due makes no network call at all. A whole-call gateway failure
    /// propagates with the queue untouched, so re-flushing later is always
    /// safe. Per-item failures re-enter the queue with escalating backoff.
    pub async fn flush<G: RecordGateway>(
        &self,
        gateway: &mut G,
        now: DateTime<Utc>,
    ) -> SyncResult<FlushSummary> {
        // Holding the store lock across the cycle is the single-flight
        // guard: a concurrent flush or enqueue waits for the commit below.
        let mut store = self.store.lock().await;

        let records = store.all()?;
        let due_count = records.iter().filter(|r| r.is_due(now)).count();

        if due_count == 0 {
            tracing::debug!("flush: nothing due, {} deferred", records.len());
            return Ok(FlushSummary::empty(records.len()));
        }

        let envelopes: Vec<UploadEnvelope> = records
            .iter()
            .filter(|r| r.is_due(now))
            .map(UploadEnvelope::from_record)
            .collect();

        // One batched call per cycle regardless of queue depth
        let results = gateway.upsert(envelopes).await?;
        let by_key: HashMap<&str, &UpsertResult> =
            results.iter().map(|r| (r.key.as_str(), r)).collect();

        let mut entries = Vec::with_capacity(due_count);
        let mut retained = Vec::with_capacity(records.len());
        let mut sent = 0usize;
        let mut error_count = 0usize;

        for mut record in records {
            if !record.is_due(now) {
                retained.push(record);
                continue;
            }

            // Matching is by key: the gateway may reorder its response
            match by_key.get(record.key.as_str()) {
                Some(result) if result.ok => {
                    // Applied remotely. `created: false` means the key was
                    // already there, which is just as final.
                    sent += 1;
                    entries.push(FlushEntry {
                        subject_id: record.subject_id.clone(),
                        status: FlushStatus::Sent,
                        kind: record.kind,
                    });
                    tracing::debug!(
                        "record {} applied (created: {:?})",
                        record.key,
                        result.created
                    );
                }
                outcome => {
                    let reason = match outcome {
                        Some(result) => result
                            .error
                            .clone()
                            .unwrap_or_else(|| "upsert rejected".to_string()),
                        None => "no result for key in upsert response".to_string(),
                    };
                    record.mark_failed(reason, now);

                    if record.retry_count == self.config.stuck_after {
                        tracing::warn!(
                            "record {} still unsynced after {} attempts: {}",
                            record.key,
                            record.retry_count,
                            record.last_error.as_deref().unwrap_or("unknown error")
                        );
                    }

                    error_count += 1;
                    entries.push(FlushEntry {
                        subject_id: record.subject_id.clone(),
                        status: FlushStatus::Failed,
                        kind: record.kind,
                    });
                    retained.push(record);
                }
            }
        }

        // Atomic commit point: one snapshot replace. A crash before this
        // leaves the queue as it was, and re-running the cycle is safe
        // because delivery is idempotent by key.
        store.replace(&retained)?;

        let summary = FlushSummary {
            sent,
            error_count,
            total_count: due_count,
            remaining: retained.len(),
            entries,
        };

        tracing::info!(
            "flush: sent {} of {} due, {} failed, {} remaining",
            summary.sent,
            summary.total_count,
            summary.error_count,
            summary.remaining
        );

        Ok(summary)
    }
}
