// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Key-value daemon (kvsd)
//!
//! Rebuilds the store from the transaction log, then serves it over HTTP.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod server;

pub use config::{Backend, Config};
pub use error::ApiError;
pub use lifecycle::{startup, DaemonState, LifecycleError};
