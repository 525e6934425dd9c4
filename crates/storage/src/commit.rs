// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded commit queue and the background committer shared by all backends
//!
//! Producers enqueue events on a bounded channel; a single committer task
//! drains it and persists each event through an `EventSink`, strictly in
//! dequeue order. That task is the only writer of the durable medium.

use crate::error::LoggerError;
use crate::logger::{ErrorFeed, LoggerOptions, WriteFailurePolicy};
use async_trait::async_trait;
use kvs_core::Event;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Durable medium written by the committer
#[async_trait]
pub(crate) trait EventSink: Send + 'static {
    /// Persist one event, returning the sequence number it was stored under
    async fn append(&mut self, event: &Event) -> Result<u64, LoggerError>;

    /// Called once after the queue is closed and drained
    async fn flush(&mut self) -> Result<(), LoggerError> {
        Ok(())
    }
}

enum QueueState {
    Idle,
    Running {
        events: mpsc::Sender<Event>,
        committer: JoinHandle<()>,
    },
    Closed,
}

/// Producer side of the committer plus its lifecycle
pub(crate) struct CommitQueue {
    options: LoggerOptions,
    state: Mutex<QueueState>,
    // Moved into the committer on start, so the feed closes when it exits
    error_tx: Mutex<Option<mpsc::Sender<LoggerError>>>,
    error_rx: Mutex<Option<ErrorFeed>>,
}

impl CommitQueue {
    pub(crate) fn new(options: LoggerOptions) -> Self {
        let (error_tx, error_rx) = mpsc::channel(1);
        Self {
            options,
            state: Mutex::new(QueueState::Idle),
            error_tx: Mutex::new(Some(error_tx)),
            error_rx: Mutex::new(Some(error_rx)),
        }
    }

    pub(crate) fn options(&self) -> LoggerOptions {
        self.options
    }

    pub(crate) fn errors(&self) -> Option<ErrorFeed> {
        self.error_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Whether `start` has been called and `close` has not
    pub(crate) fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(|e| e.into_inner()),
            QueueState::Running { .. }
        )
    }

    /// Spawn the committer over the given sink
    pub(crate) fn start<S: EventSink>(&self, sink: S) -> Result<(), LoggerError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            QueueState::Idle => {}
            QueueState::Running { .. } => return Err(LoggerError::AlreadyRunning),
            QueueState::Closed => return Err(LoggerError::Closed),
        }

        let errors = self
            .error_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(LoggerError::AlreadyRunning)?;

        let (events, rx) = mpsc::channel(self.options.queue_capacity);
        let committer = tokio::spawn(commit_loop(
            sink,
            rx,
            errors,
            self.options.on_write_failure,
        ));

        *state = QueueState::Running { events, committer };
        Ok(())
    }

    /// Hand an event to the committer, waiting while the queue is full
    pub(crate) async fn enqueue(&self, event: Event) -> Result<(), LoggerError> {
        let events = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &*state {
                QueueState::Idle => return Err(LoggerError::NotRunning),
                QueueState::Running { events, .. } => events.clone(),
                QueueState::Closed => return Err(LoggerError::Closed),
            }
        };

        events
            .send(event)
            .await
            .map_err(|_| LoggerError::CommitterStopped)
    }

    /// Refuse new events, then wait for the committer to drain the queue
    pub(crate) async fn close(&self) -> Result<(), LoggerError> {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *state, QueueState::Closed)
        };
        self.error_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        match previous {
            QueueState::Running { events, committer } => {
                drop(events);
                committer
                    .await
                    .map_err(|e| LoggerError::Committer(e.to_string()))
            }
            QueueState::Idle | QueueState::Closed => Ok(()),
        }
    }
}

async fn commit_loop<S: EventSink>(
    mut sink: S,
    mut events: mpsc::Receiver<Event>,
    errors: mpsc::Sender<LoggerError>,
    policy: WriteFailurePolicy,
) {
    let mut committed: u64 = 0;

    while let Some(event) = events.recv().await {
        match sink.append(&event).await {
            Ok(sequence) => {
                committed += 1;
                tracing::trace!(
                    sequence,
                    event_type = %event.event_type,
                    key = %event.key,
                    "committed"
                );
            }
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    key = %event.key,
                    error = %e,
                    "write failed"
                );
                match policy {
                    WriteFailurePolicy::Halt => {
                        // Closing the queue first makes later enqueues fail fast
                        events.close();
                        let _ = errors.send(e).await;
                        tracing::error!(committed, "committer halted");
                        return;
                    }
                    WriteFailurePolicy::Continue => report(&errors, e),
                }
            }
        }
    }

    if let Err(e) = sink.flush().await {
        tracing::error!(error = %e, "flush failed");
        report(&errors, e);
    }
    tracing::debug!(committed, "committer drained");
}

/// Attempt delivery on the single-slot feed without stalling the committer
fn report(errors: &mpsc::Sender<LoggerError>, error: LoggerError) {
    match errors.try_send(error) {
        Ok(()) => {}
        Err(TrySendError::Full(e)) => {
            tracing::error!(error = %e, "error feed full, dropping error")
        }
        Err(TrySendError::Closed(e)) => {
            tracing::warn!(error = %e, "error feed closed, dropping error")
        }
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
