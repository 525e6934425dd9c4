// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kvs-core: shared types for the key-value store
//!
//! This crate provides:
//! - `Event` and `EventType`, the durable unit of change
//! - The `KeyValueStore` contract and the in-memory `MemoryStore`

pub mod event;
pub mod store;

pub use event::{Event, EventError, EventType};
pub use store::{KeyValueStore, MemoryStore, StoreError};
