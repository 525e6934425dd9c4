// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery: replay the transaction log into the store
//!
//! Replay must finish cleanly before the logger goes live. Any replay error
//! is fatal; serving with a partially applied history is never allowed.

use crate::error::LoggerError;
use crate::logger::{Replay, TransactionLogger};
use kvs_core::{Event, EventType, KeyValueStore, StoreError};
use thiserror::Error;

/// Errors that abort recovery
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("replay failed: {0}")]
    Replay(#[source] LoggerError),

    #[error("store rejected event {sequence}: {source}")]
    Store { sequence: u64, source: StoreError },

    #[error("failed to start transaction logger: {0}")]
    Start(#[source] LoggerError),
}

/// Counts gathered while replaying
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryStats {
    pub events: u64,
    pub puts: u64,
    pub deletes: u64,
    pub last_sequence: u64,
}

impl RecoveryStats {
    fn record(&mut self, event: &Event) {
        self.events += 1;
        match event.event_type {
            EventType::Put => self.puts += 1,
            EventType::Delete => self.deletes += 1,
        }
        self.last_sequence = event.sequence;
    }
}

/// Drain one replay pass into `store`
pub async fn restore<L, S>(logger: &L, store: &S) -> Result<RecoveryStats, RecoveryError>
where
    L: TransactionLogger + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let Replay {
        mut events,
        mut errors,
    } = logger.read_events();
    let mut stats = RecoveryStats::default();

    loop {
        tokio::select! {
            biased;

            Some(e) = errors.recv() => return Err(RecoveryError::Replay(e)),

            event = events.recv() => match event {
                Some(event) => {
                    store.apply(&event).map_err(|source| RecoveryError::Store {
                        sequence: event.sequence,
                        source,
                    })?;
                    stats.record(&event);
                }
                None => break,
            },
        }
    }

    // The error slot is filled before the streams close
    if let Some(e) = errors.recv().await {
        return Err(RecoveryError::Replay(e));
    }

    tracing::info!(
        events = stats.events,
        puts = stats.puts,
        deletes = stats.deletes,
        last_sequence = stats.last_sequence,
        "replay complete"
    );
    Ok(stats)
}

/// Restore `store` from the log, then switch the logger to live writes
pub async fn recover<L, S>(logger: &L, store: &S) -> Result<RecoveryStats, RecoveryError>
where
    L: TransactionLogger + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let stats = restore(logger, store).await?;
    logger.run().map_err(RecoveryError::Start)?;
    Ok(stats)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
