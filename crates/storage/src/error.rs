// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use kvs_core::EventError;
use thiserror::Error;

/// Errors raised by transaction logger backends
///
/// Persistence failures travel on the error feed or the replay error
/// channel. Only misuse (`NotRunning`, `Closed`, `EmptyKey`) and a halted
/// committer are reported synchronously by the write operations.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("input parse error at line {line}: {reason}")]
    Parse { line: u64, reason: String },

    #[error("invalid transaction row {sequence}: {reason}")]
    InvalidRow { sequence: u64, reason: String },

    #[error("transaction numbers out of sequence: {found} after {previous}")]
    OutOfOrder { previous: u64, found: u64 },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("key must not be empty")]
    EmptyKey,

    #[error("transaction logger is not running")]
    NotRunning,

    #[error("transaction logger is already running")]
    AlreadyRunning,

    #[error("transaction logger is closed")]
    Closed,

    #[error("committer stopped after a write failure")]
    CommitterStopped,

    #[error("committer task failed: {0}")]
    Committer(String),
}
