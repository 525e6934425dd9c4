// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed transaction logger
//!
//! Appends one tab-delimited line per event to a local file. Sequence
//! numbers come from an in-process counter that replay seeds, so new
//! events continue the sequence space already on disk.

use crate::codec;
use crate::commit::{CommitQueue, EventSink};
use crate::error::LoggerError;
use crate::logger::{
    require_key, ErrorFeed, LoggerOptions, Replay, TransactionLogger, WriteFailurePolicy,
};
use async_trait::async_trait;
use kvs_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

/// Transaction logger writing to an append-only file
pub struct FileTransactionLogger {
    path: PathBuf,
    // Handed to the committer by `run`
    file: Mutex<Option<File>>,
    last_sequence: Arc<AtomicU64>,
    replayed: Arc<AtomicBool>,
    queue: CommitQueue,
}

impl FileTransactionLogger {
    /// Open or create the log at `path`, halting on the first write failure
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoggerError> {
        Self::open_with(path, LoggerOptions::new(WriteFailurePolicy::Halt))
    }

    pub fn open_with(path: impl AsRef<Path>, options: LoggerOptions) -> Result<Self, LoggerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
            last_sequence: Arc::new(AtomicU64::new(0)),
            replayed: Arc::new(AtomicBool::new(false)),
            queue: CommitQueue::new(options),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> LoggerOptions {
        self.queue.options()
    }

    /// Highest sequence number replayed or written so far
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionLogger for FileTransactionLogger {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LoggerError> {
        require_key(key)?;
        self.queue.enqueue(Event::put(key, value)).await
    }

    async fn write_delete(&self, key: &str) -> Result<(), LoggerError> {
        require_key(key)?;
        self.queue.enqueue(Event::delete(key)).await
    }

    fn errors(&self) -> Option<ErrorFeed> {
        self.queue.errors()
    }

    fn read_events(&self) -> Replay {
        let (event_tx, error_tx, replay) = Replay::channel();
        let path = self.path.clone();
        let last_sequence = Arc::clone(&self.last_sequence);
        let replayed = Arc::clone(&self.replayed);

        tokio::spawn(async move {
            match replay_file(&path, &event_tx, &last_sequence).await {
                Ok(Some(count)) => {
                    replayed.store(true, Ordering::SeqCst);
                    tracing::debug!(path = %path.display(), count, "replay finished");
                }
                Ok(None) => tracing::debug!("replay abandoned by consumer"),
                Err(e) => {
                    let _ = error_tx.send(e).await;
                }
            }
        });

        replay
    }

    fn run(&self) -> Result<(), LoggerError> {
        if self.queue.is_running() {
            return Err(LoggerError::AlreadyRunning);
        }

        // Without a completed replay the counter could reuse sequences on disk
        if !self.replayed.load(Ordering::SeqCst) && std::fs::metadata(&self.path)?.len() > 0 {
            let last = scan_last_sequence(&self.path)?;
            self.last_sequence.fetch_max(last, Ordering::SeqCst);
            tracing::debug!(last, "seeded sequence from existing log");
        }

        let file = self
            .file
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(LoggerError::Closed)?;

        self.queue.start(FileSink {
            file: tokio::fs::File::from_std(file),
            last_sequence: Arc::clone(&self.last_sequence),
        })
    }

    async fn close(&self) -> Result<(), LoggerError> {
        self.queue.close().await
    }
}

struct FileSink {
    file: tokio::fs::File,
    last_sequence: Arc<AtomicU64>,
}

#[async_trait]
impl EventSink for FileSink {
    async fn append(&mut self, event: &Event) -> Result<u64, LoggerError> {
        // Claimed before writing: a failed write may still reach the medium,
        // so its number is spent and the next event never repeats it
        let sequence = self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let line = codec::format_line(&event.with_sequence(sequence));

        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        self.file.sync_data().await?;

        Ok(sequence)
    }

    async fn flush(&mut self) -> Result<(), LoggerError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(())
    }
}

/// Stream the file into `events`. Returns `None` if the consumer hung up.
async fn replay_file(
    path: &Path,
    events: &mpsc::Sender<Event>,
    last_sequence: &AtomicU64,
) -> Result<Option<u64>, LoggerError> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = tokio::io::BufReader::new(file).lines();

    let mut line_number = 0;
    let mut previous = 0;
    let mut count = 0;

    while let Some(text) = lines.next_line().await? {
        line_number += 1;
        if text.is_empty() {
            continue;
        }

        let event = codec::parse_line(line_number, &text)?;
        if event.sequence <= previous {
            return Err(LoggerError::OutOfOrder {
                previous,
                found: event.sequence,
            });
        }
        previous = event.sequence;
        last_sequence.fetch_max(previous, Ordering::SeqCst);

        if events.send(event).await.is_err() {
            return Ok(None);
        }
        count += 1;
    }

    Ok(Some(count))
}

/// Validate the whole log and return its last sequence number
fn scan_last_sequence(path: &Path) -> Result<u64, LoggerError> {
    let reader = BufReader::new(File::open(path)?);
    let mut previous = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let event = codec::parse_line(index as u64 + 1, &line)?;
        if event.sequence <= previous {
            return Err(LoggerError::OutOfOrder {
                previous,
                found: event.sequence,
            });
        }
        previous = event.sequence;
    }

    Ok(previous)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
