// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tend-core operations.

use thiserror::Error;

/// All possible errors that can occur in tend-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid record kind: '{0}'\n  hint: valid kinds are: observation")]
    InvalidKind(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// A specialized Result type for tend-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
