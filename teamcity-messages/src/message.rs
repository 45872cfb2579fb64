// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{SerializeError, serialize::serialize_message};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use std::io;

/// A single TeamCity service message.
///
/// Use the typed constructors such as [`ServiceMessage::test_started`] for the messages TeamCity
/// knows about, or [`ServiceMessage::new`] and [`ServiceMessage::set_attribute`] for anything else.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ServiceMessage {
    /// The message name, e.g. `testStarted`.
    pub name: String,

    /// The payload of the message.
    pub value: MessageValue,

    /// The flow this message belongs to.
    ///
    /// TeamCity uses flows to tell apart interleaved output from parallel processes. Serialized as
    /// the `flowId` attribute.
    pub flow_id: Option<String>,

    /// The time at which the message was generated.
    ///
    /// Serialized as the `timestamp` attribute, in the `yyyy-MM-dd'T'HH:mm:ss.SSSZ` format.
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl ServiceMessage {
    /// Creates a new message with the given name and no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MessageValue::Attributes(IndexMap::new()),
            flow_id: None,
            timestamp: None,
        }
    }

    /// Creates a new message of the form `##teamcity[name 'value']`.
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MessageValue::Single(value.into()),
            flow_id: None,
            timestamp: None,
        }
    }

    /// Creates a `testSuiteStarted` message.
    pub fn test_suite_started(name: impl Into<String>) -> Self {
        let mut message = Self::new("testSuiteStarted");
        message.set_attribute("name", name);
        message
    }

    /// Creates a `testSuiteFinished` message.
    pub fn test_suite_finished(name: impl Into<String>) -> Self {
        let mut message = Self::new("testSuiteFinished");
        message.set_attribute("name", name);
        message
    }

    /// Creates a `testStarted` message.
    ///
    /// Standard output produced until the matching `testFinished` is attached to the test.
    pub fn test_started(name: impl Into<String>) -> Self {
        let mut message = Self::new("testStarted");
        message
            .set_attribute("name", name)
            .set_attribute("captureStandardOutput", "true");
        message
    }

    /// Creates a `testFinished` message.
    pub fn test_finished(name: impl Into<String>) -> Self {
        let mut message = Self::new("testFinished");
        message.set_attribute("name", name);
        message
    }

    /// Creates a `testFailed` message.
    pub fn test_failed(
        name: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let mut out = Self::new("testFailed");
        out.set_attribute("name", name)
            .set_attribute("message", message)
            .set_attribute("details", details);
        out
    }

    /// Sets an attribute, replacing any previous value for the same key.
    ///
    /// A single-value message is turned into an attribute message; its previous value is lost.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        match &mut self.value {
            MessageValue::Attributes(attributes) => {
                attributes.insert(key.into(), value.into());
            }
            MessageValue::Single(_) => {
                let mut attributes = IndexMap::new();
                attributes.insert(key.into(), value.into());
                self.value = MessageValue::Attributes(attributes);
            }
        }
        self
    }

    /// Returns the value of an attribute, if this is an attribute message and the key is set.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match &self.value {
            MessageValue::Attributes(attributes) => attributes.get(key).map(|s| s.as_str()),
            MessageValue::Single(_) => None,
        }
    }

    /// Sets the flow ID.
    pub fn set_flow_id(&mut self, flow_id: impl Into<String>) -> &mut Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    /// Sets the timestamp.
    pub fn set_timestamp(&mut self, timestamp: impl Into<DateTime<FixedOffset>>) -> &mut Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Serialize this message to the given writer, followed by a newline.
    ///
    /// Nothing is written if the message fails validation.
    pub fn serialize(&self, writer: impl io::Write) -> Result<(), SerializeError> {
        serialize_message(self, writer)
    }

    /// Serialize this message to a string, including the trailing newline.
    pub fn to_line(&self) -> Result<String, SerializeError> {
        let mut buf: Vec<u8> = vec![];
        self.serialize(&mut buf)?;
        // The serializer only ever writes UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// The payload of a [`ServiceMessage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageValue {
    /// A single unnamed value: `##teamcity[name 'value']`.
    Single(String),

    /// Named attributes in insertion order: `##teamcity[name key='value' ...]`.
    Attributes(IndexMap<String, String>),
}
