// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of report events.
//!
//! The formatter describes what to report through the [`ReportEmitter`] trait.
//! [`TeamcityEmitter`] renders those reports as TeamCity service messages.

use crate::{errors::WriteEventError, events::FailureDetail};
use chrono::Local;
use std::io;
use swrite::{SWrite, swrite};
use teamcity_messages::ServiceMessage;

/// A sink for report events.
pub trait ReportEmitter {
    /// A suite (feature) was opened.
    fn suite_started(&mut self, name: &str) -> Result<(), WriteEventError>;

    /// A suite (feature) was closed.
    fn suite_finished(&mut self, name: &str) -> Result<(), WriteEventError>;

    /// A test case attempt started.
    fn test_started(&mut self, name: &str) -> Result<(), WriteEventError>;

    /// A test case attempt finished.
    fn test_finished(&mut self, name: &str) -> Result<(), WriteEventError>;

    /// A test case finally failed. `failures` holds one entry per failed attempt, in order.
    fn test_failed(&mut self, name: &str, failures: &[FailureDetail])
    -> Result<(), WriteEventError>;

    /// Free-form text, written as its own line.
    fn raw_line(&mut self, text: &str) -> Result<(), WriteEventError>;
}

impl<E: ReportEmitter + ?Sized> ReportEmitter for &mut E {
    fn suite_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        (**self).suite_started(name)
    }

    fn suite_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        (**self).suite_finished(name)
    }

    fn test_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        (**self).test_started(name)
    }

    fn test_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        (**self).test_finished(name)
    }

    fn test_failed(
        &mut self,
        name: &str,
        failures: &[FailureDetail],
    ) -> Result<(), WriteEventError> {
        (**self).test_failed(name, failures)
    }

    fn raw_line(&mut self, text: &str) -> Result<(), WriteEventError> {
        (**self).raw_line(text)
    }
}

/// Writes report events as TeamCity service messages.
#[derive(Debug)]
pub struct TeamcityEmitter<W> {
    writer: W,
    flow_id: Option<String>,
    timestamps: bool,
}

impl<W: io::Write> TeamcityEmitter<W> {
    /// Creates a new emitter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            flow_id: None,
            timestamps: false,
        }
    }

    /// Tags every service message with a `flowId` attribute.
    pub fn set_flow_id(&mut self, flow_id: impl Into<String>) -> &mut Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    /// Adds a `timestamp` attribute with the local time to every service message.
    pub fn set_timestamps(&mut self, timestamps: bool) -> &mut Self {
        self.timestamps = timestamps;
        self
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<(), WriteEventError> {
        self.writer.flush().map_err(WriteEventError::Io)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, mut message: ServiceMessage) -> Result<(), WriteEventError> {
        if let Some(flow_id) = &self.flow_id {
            message.set_flow_id(flow_id.clone());
        }
        if self.timestamps {
            message.set_timestamp(Local::now().fixed_offset());
        }
        message.serialize(&mut self.writer)?;
        Ok(())
    }
}

impl<W: io::Write> ReportEmitter for TeamcityEmitter<W> {
    fn suite_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.write(ServiceMessage::test_suite_started(name))
    }

    fn suite_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.write(ServiceMessage::test_suite_finished(name))
    }

    fn test_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.write(ServiceMessage::test_started(name))
    }

    fn test_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.write(ServiceMessage::test_finished(name))
    }

    fn test_failed(
        &mut self,
        name: &str,
        failures: &[FailureDetail],
    ) -> Result<(), WriteEventError> {
        self.write(ServiceMessage::test_failed(
            name,
            failure_message(failures),
            failure_details(failures),
        ))
    }

    fn raw_line(&mut self, text: &str) -> Result<(), WriteEventError> {
        writeln!(self.writer, "{text}").map_err(WriteEventError::Io)
    }
}

/// Returns the summary message for a failed test case: the message of the last failure.
pub fn failure_message(failures: &[FailureDetail]) -> &str {
    failures.last().map_or("", |failure| failure.message.as_str())
}

/// Returns the details for a failed test case.
///
/// Each failure is rendered as `kind: message` followed by its backtrace frames indented by two
/// spaces. With more than one failure, each is prefixed by `Attempt N: ` (counting from 1) and
/// failures are separated by a blank line.
pub fn failure_details(failures: &[FailureDetail]) -> String {
    let mut out = String::new();
    let numbered = failures.len() > 1;
    for (index, failure) in failures.iter().enumerate() {
        if index > 0 {
            out.push_str("\n\n");
        }
        if numbered {
            swrite!(out, "Attempt {}: ", index + 1);
        }
        swrite!(out, "{failure}");
        for frame in failure.backtrace.iter() {
            swrite!(out, "\n  {frame}");
        }
    }
    out
}
