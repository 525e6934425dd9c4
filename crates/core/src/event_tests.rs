// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    delete = { 1, EventType::Delete },
    put = { 2, EventType::Put },
)]
fn event_type_decodes_known_codes(code: u8, expected: EventType) {
    assert_eq!(EventType::try_from(code).unwrap(), expected);
    assert_eq!(expected.code(), code);
}

#[parameterized(
    reserved_zero = { 0 },
    unknown = { 3 },
    max = { 255 },
)]
fn event_type_rejects_unknown_codes(code: u8) {
    assert_eq!(
        EventType::try_from(code),
        Err(EventError::InvalidType(code.into()))
    );
}

#[test]
fn event_type_from_database_column() {
    assert_eq!(EventType::try_from(2i16).unwrap(), EventType::Put);
    assert_eq!(
        EventType::try_from(-1i16),
        Err(EventError::InvalidType(-1))
    );
    assert_eq!(
        EventType::try_from(0i16),
        Err(EventError::InvalidType(0))
    );
}

#[test]
fn event_type_display() {
    assert_eq!(EventType::Put.to_string(), "PUT");
    assert_eq!(EventType::Delete.to_string(), "DELETE");
}

#[test]
fn new_events_are_unsequenced() {
    let put = Event::put("a", "1");
    assert_eq!(put.sequence, 0);
    assert!(!put.is_sequenced());
    assert_eq!(put.event_type, EventType::Put);
    assert_eq!(put.value, "1");

    let delete = Event::delete("a");
    assert_eq!(delete.event_type, EventType::Delete);
    assert!(delete.value.is_empty());
}

#[test]
fn with_sequence_leaves_original_untouched() {
    let original = Event::put("k", "v");
    let sequenced = original.with_sequence(7);

    assert_eq!(sequenced.sequence, 7);
    assert!(sequenced.is_sequenced());
    assert_eq!(sequenced.key, "k");
    assert_eq!(original.sequence, 0);
}
