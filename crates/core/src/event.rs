// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events recorded in the transaction log
//!
//! An `Event` is the durable unit of change: one PUT or DELETE of a single
//! key. Events are built unsequenced by producers and receive their sequence
//! number from the logger backend that persists them.

use std::fmt;
use thiserror::Error;

/// Errors decoding event fields from durable storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("invalid event type: {0}")]
    InvalidType(i64),
}

/// Kind of mutation an event records
///
/// The numeric encoding is what lands on disk and in the database. Zero is
/// never a valid encoding, so a zeroed or truncated record cannot decode as
/// a real operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventType {
    Delete = 1,
    Put = 2,
}

impl EventType {
    /// Numeric encoding used by every backend
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EventType {
    type Error = EventError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(EventType::Delete),
            2 => Ok(EventType::Put),
            other => Err(EventError::InvalidType(other.into())),
        }
    }
}

impl TryFrom<i16> for EventType {
    type Error = EventError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        u8::try_from(code)
            .map_err(|_| EventError::InvalidType(code.into()))
            .and_then(EventType::try_from)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Delete => write!(f, "DELETE"),
            EventType::Put => write!(f, "PUT"),
        }
    }
}

/// A single logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Assigned by the logger; 0 means "not yet sequenced"
    pub sequence: u64,
    pub event_type: EventType,
    pub key: String,
    /// Empty for DELETE events
    pub value: String,
}

impl Event {
    /// Create an unsequenced PUT event
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            event_type: EventType::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an unsequenced DELETE event
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            event_type: EventType::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Return a copy of this event carrying the given sequence number
    pub fn with_sequence(&self, sequence: u64) -> Self {
        Self {
            sequence,
            ..self.clone()
        }
    }

    /// Whether a backend has assigned this event a sequence number
    pub fn is_sequenced(&self) -> bool {
        self.sequence != 0
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
