// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Transaction log for the key-value store
//!
//! Every mutation is recorded here before it is considered committed.
//!
//! ```text
//! write_put / write_delete → CommitQueue (bounded) → committer task → EventSink
//!                                                                       ├── file (tab-delimited lines)
//!                                                                       └── postgres (transactions table)
//!
//! startup: read_events() → recovery::restore → KeyValueStore, then run()
//! ```

mod codec;
mod commit;
mod error;
pub mod file;
mod logger;
pub mod postgres;
pub mod recovery;
pub mod traced;

pub use error::LoggerError;
pub use file::FileTransactionLogger;
pub use logger::{
    ErrorFeed, LoggerOptions, Replay, TransactionLogger, WriteFailurePolicy,
    DEFAULT_QUEUE_CAPACITY,
};
pub use postgres::{PostgresParams, PostgresTransactionLogger};
pub use recovery::{recover, restore, RecoveryError, RecoveryStats};
pub use traced::TracedTransactionLogger;
