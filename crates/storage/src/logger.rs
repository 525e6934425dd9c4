// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract every transaction logger backend implements

use crate::error::LoggerError;
use async_trait::async_trait;
use kvs_core::Event;
use tokio::sync::mpsc;

/// Outstanding events a producer may enqueue before it has to wait
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Receiver for asynchronous committer failures (single slot)
pub type ErrorFeed = mpsc::Receiver<LoggerError>;

/// What the committer does after a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Report the error and stop servicing the queue
    Halt,
    /// Report the error and keep servicing the queue
    Continue,
}

/// Tuning shared by all backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    pub queue_capacity: usize,
    pub on_write_failure: WriteFailurePolicy,
}

impl LoggerOptions {
    pub fn new(on_write_failure: WriteFailurePolicy) -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            on_write_failure,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        // tokio's bounded channel panics on zero capacity
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Paired streams produced by one replay pass
///
/// `events` yields records in ascending sequence order. Both channels close
/// together when the pass ends; an error, if any, is sent before closing.
pub struct Replay {
    pub events: mpsc::Receiver<Event>,
    pub errors: mpsc::Receiver<LoggerError>,
}

impl Replay {
    /// Create the channel pair for a replay task (events are pull-paced)
    pub(crate) fn channel() -> (mpsc::Sender<Event>, mpsc::Sender<LoggerError>, Self) {
        let (event_tx, events) = mpsc::channel(1);
        let (error_tx, errors) = mpsc::channel(1);
        (event_tx, error_tx, Self { events, errors })
    }
}

/// Durable, ordered record of store mutations
///
/// Usage: construct, drain `read_events()` into the store, then `run()`,
/// then route mutations through `write_put` / `write_delete`.
#[async_trait]
pub trait TransactionLogger: Send + Sync + 'static {
    /// Enqueue a PUT, waiting while the queue is full
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LoggerError>;

    /// Enqueue a DELETE, waiting while the queue is full
    async fn write_delete(&self, key: &str) -> Result<(), LoggerError>;

    /// Take the committer's error feed. Returns `None` once taken.
    fn errors(&self) -> Option<ErrorFeed>;

    /// Start a replay pass over durable storage
    fn read_events(&self) -> Replay;

    /// Start the background committer. Must be called exactly once.
    fn run(&self) -> Result<(), LoggerError>;

    /// Stop accepting writes and wait until every queued event is persisted
    async fn close(&self) -> Result<(), LoggerError>;
}

pub(crate) fn require_key(key: &str) -> Result<(), LoggerError> {
    if key.is_empty() {
        return Err(LoggerError::EmptyKey);
    }
    Ok(())
}
