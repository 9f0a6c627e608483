// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tend-core: Shared library for the tend sync core
//!
//! This crate provides the pure data model of the offline observation
//! queue: pending records and their idempotency keys, the retry backoff
//! law, and the wire/report types exchanged between the sync engine, the
//! remote record store, and the UI.

pub mod backoff;
pub mod clock;
pub mod error;
pub mod key;
pub mod protocol;
pub mod record;
pub mod report;

pub use backoff::{next_attempt_at, retry_delay_ms};
pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use key::record_key;
pub use protocol::{BatchUpsertRequest, BatchUpsertResponse, UploadEnvelope, UpsertResult};
pub use record::{PendingRecord, RecordDraft, RecordKind};
pub use report::{FlushEntry, FlushStatus, FlushSummary};
