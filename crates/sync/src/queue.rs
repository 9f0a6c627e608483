// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue store for pending records.
//!
//! Records are persisted as JSONL (one record per line) and fsynced on
//! every write, so the queue survives process restarts. The store is
//! bounded: appending at capacity evicts the oldest records and reports a
//! warning outcome to the caller.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tend_core::PendingRecord;

/// Error type for queue store operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another store instance holds the queue lock.
    #[error("queue is locked by another process: {0}")]
    Locked(String),
}

/// Result type for queue store operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Outcome of appending one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// True when capacity pressure evicted older unsynced records.
    pub warned: bool,
    /// Queue length after the append.
    pub size: usize,
}

/// Durable, bounded, insertion-ordered store of pending records.
///
/// Only two writers exist by contract: `add` (single-item, capacity
/// checked) and `replace` (full snapshot, engine only).
pub struct QueueStore {
    /// Path to the queue file.
    path: PathBuf,
    /// Maximum queue length before eviction.
    max_len: usize,
    /// Advisory lock held for the lifetime of the store.
    _lock: File,
}

impl QueueStore {
    /// Create or open a queue store at the given path.
    ///
    /// Takes an exclusive advisory lock on `<path>.lock`; a second open of
    /// the same queue fails with [`QueueError::Locked`].
    pub fn open(path: &Path, max_len: usize) -> QueueResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Ensure the queue file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        let lock_path = PathBuf::from(format!("{}.lock", path.display()));
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| QueueError::Locked(lock_path.display().to_string()))?;

        Ok(QueueStore {
            path: path.to_path_buf(),
            max_len,
            _lock: lock,
        })
    }

    /// Read all pending records, insertion order preserved.
    pub fn all(&self) -> QueueResult<Vec<PendingRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PendingRecord = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }

    /// Append one record, evicting oldest-first at capacity.
    ///
    /// The record is immediately persisted to disk. When the queue is
    /// already at capacity the oldest records are dropped to make room and
    /// `warned` is set so the caller can surface "queue is full, oldest
    /// unsynced items were dropped".
    pub fn add(&mut self, record: &PendingRecord) -> QueueResult<AddOutcome> {
        let mut records = self.all()?;

        if records.len() < self.max_len {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;

            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}")?;
            file.sync_all()?;

            return Ok(AddOutcome {
                warned: false,
                size: records.len() + 1,
            });
        }

        let excess = records.len() + 1 - self.max_len;
        records.drain(..excess);
        records.push(record.clone());
        self.replace(&records)?;

        Ok(AddOutcome {
            warned: true,
            size: records.len(),
        })
    }

    /// Atomically overwrite the entire collection.
    ///
    /// The new contents go to a temporary file, fsynced, then renamed over
    /// the live file; an interrupted rewrite leaves the previous state
    /// intact.
    pub fn replace(&mut self, records: &[PendingRecord]) -> QueueResult<()> {
        let tmp_path = PathBuf::from(format!("{}.tmp", self.path.display()));

        {
            let mut file = File::create(&tmp_path)?;
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(file, "{json}")?;
            }
            file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Get the number of pending records.
    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.all()?.len())
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }
}
