// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tend-sync: Offline-first sync engine for pending observation records.
//!
//! # Architecture
//!
//! ```text
//! UI / timer ───► SyncEngine::flush ───► RecordGateway (batched upsert)
//!                     │      ▲
//!                     ▼      │ per-item outcomes, matched by key
//!                QueueStore (durable JSONL, bounded)
//! ```
//!
//! # Features
//!
//! - Durable bounded queue with oldest-first eviction and capacity warning
//! - Exactly-once-in-effect delivery via deterministic idempotency keys
//! - One batched upsert per flush cycle, reconciled by key
//! - Exponential per-item backoff; records are never silently dropped
//! - Single-flight flush guard and atomic snapshot commit
//! - Injectable gateway trait for testing

mod config;
mod engine;
mod gateway;
mod queue;

pub use config::{SyncConfig, DEFAULT_MAX_QUEUE_LEN, DEFAULT_STUCK_AFTER};
pub use engine::{SyncEngine, SyncError, SyncResult};
pub use gateway::{GatewayConfig, GatewayError, GatewayResult, HttpGateway, RecordGateway};
pub use queue::{AddOutcome, QueueError, QueueResult, QueueStore};
