// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `ServiceMessage`.

use crate::{MessageValue, SerializeError, ServiceMessage};
use std::{fmt, io};
use swrite::{SWrite, swrite};

static MESSAGE_PREFIX: &str = "##teamcity[";
static FLOW_ID_ATTR: &str = "flowId";
static TIMESTAMP_ATTR: &str = "timestamp";
static TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub(crate) fn serialize_message(
    message: &ServiceMessage,
    mut writer: impl io::Write,
) -> Result<(), SerializeError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let ServiceMessage {
        name,
        value,
        flow_id,
        timestamp,
    } = message;

    // Validate everything up front so that a bad message never produces a partial line.
    if !is_valid_name(name) {
        return Err(SerializeError::InvalidName { name: name.clone() });
    }
    match value {
        MessageValue::Single(_) => {
            if flow_id.is_some() || timestamp.is_some() {
                return Err(SerializeError::SingleValueWithAttributes { name: name.clone() });
            }
        }
        MessageValue::Attributes(attributes) => {
            if let Some(attribute) = attributes.keys().find(|key| !is_valid_name(key)) {
                return Err(SerializeError::InvalidAttributeName {
                    message: name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }
    }

    let mut line = String::with_capacity(64);
    line.push_str(MESSAGE_PREFIX);
    line.push_str(name);

    match value {
        MessageValue::Single(value) => {
            push_value(&mut line, value);
        }
        MessageValue::Attributes(attributes) => {
            for (key, value) in attributes {
                push_attribute(&mut line, key, value);
            }
            if let Some(flow_id) = flow_id {
                push_attribute(&mut line, FLOW_ID_ATTR, flow_id);
            }
            if let Some(timestamp) = timestamp {
                let timestamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
                push_attribute(&mut line, TIMESTAMP_ATTR, &timestamp);
            }
        }
    }

    line.push_str("]\n");
    writer.write_all(line.as_bytes())?;
    Ok(())
}

fn push_attribute(line: &mut String, key: &str, value: &str) {
    swrite!(line, " {key}='{}'", EscapedValue(value));
}

fn push_value(line: &mut String, value: &str) {
    swrite!(line, " '{}'", EscapedValue(value));
}

/// Names are identifiers: an ASCII letter followed by letters, digits, `.`, `_` or `-`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// A value escaped with TeamCity's `|` escape character.
///
/// <https://www.jetbrains.com/help/teamcity/service-messages.html#Escaped+Values>
pub(crate) struct EscapedValue<'s>(pub(crate) &'s str);

impl fmt::Display for EscapedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut start = 0;
        let s = self.0;

        for (i, c) in s.char_indices() {
            let escaped = match c {
                '|' => "||",
                '\'' => "|'",
                '\n' => "|n",
                '\r' => "|r",
                '[' => "|[",
                ']' => "|]",
                '\u{0085}' => "|x",
                '\u{2028}' => "|l",
                '\u{2029}' => "|p",
                _ => continue,
            };

            if start < i {
                f.write_str(&s[start..i])?;
            }
            f.write_str(escaped)?;
            start = i + c.len_utf8();
        }

        if start != s.len() {
            f.write_str(&s[start..])?;
        }

        Ok(())
    }
}
