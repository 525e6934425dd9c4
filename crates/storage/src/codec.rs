// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line format of the file-backed transaction log
//!
//! One record per line: `sequence \t event_type \t key \t value \n`.
//! Backslash, tab, newline and carriage return inside keys and values are
//! escaped so they cannot break the framing; other text is written as is.
//! A backslash is always written doubled, so a plain unescaped log holding a
//! literal backslash does not read back verbatim.

use crate::error::LoggerError;
use kvs_core::{Event, EventType};

const FIELD_SEPARATOR: char = '\t';

/// Render an event as a log line, including the trailing newline
pub(crate) fn format_line(event: &Event) -> String {
    format!(
        "{}\t{}\t{}\t{}\n",
        event.sequence,
        event.event_type.code(),
        escape(&event.key),
        escape(&event.value)
    )
}

/// Parse one log line (without its newline). `line` is 1-based, for errors.
pub(crate) fn parse_line(line: u64, text: &str) -> Result<Event, LoggerError> {
    let invalid = |reason: String| LoggerError::Parse { line, reason };

    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
    let [sequence, event_type, key, value] = fields.as_slice() else {
        return Err(invalid(format!(
            "expected 4 fields, found {}",
            fields.len()
        )));
    };

    let sequence: u64 = sequence
        .parse()
        .map_err(|e| invalid(format!("bad sequence {sequence:?}: {e}")))?;
    if sequence == 0 {
        return Err(invalid("sequence 0 is reserved".to_string()));
    }

    let code: u8 = event_type
        .parse()
        .map_err(|e| invalid(format!("bad event type {event_type:?}: {e}")))?;
    let event_type = EventType::try_from(code).map_err(|e| invalid(e.to_string()))?;

    let key = unescape(key).map_err(&invalid)?;
    if key.is_empty() {
        return Err(invalid("empty key".to_string()));
    }

    let value = match event_type {
        EventType::Put => unescape(value).map_err(&invalid)?,
        EventType::Delete => String::new(),
    };

    Ok(Event {
        sequence,
        event_type,
        key,
        value,
    })
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => return Err(format!("invalid escape \\{other}")),
            None => return Err("dangling escape at end of field".to_string()),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
