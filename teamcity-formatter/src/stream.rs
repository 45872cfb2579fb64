// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading events from newline-delimited JSON.

use crate::{
    emitter::ReportEmitter,
    errors::{EventStreamError, RunStreamError},
    events::Event,
    formatter::TeamcityFormatter,
    lookup::FeatureIndex,
};
use std::io::BufRead;
use tracing::{debug, warn};

/// An iterator over the events in a newline-delimited JSON stream.
///
/// Blank lines are skipped. Iteration stops after the first error.
#[derive(Debug)]
pub struct EventStream<R> {
    reader: R,
    buf: String,
    line: usize,
    done: bool,
}

impl<R: BufRead> EventStream<R> {
    /// Creates a new event stream reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line: 0,
            done: false,
        }
    }

    /// Returns the number of lines read so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = Result<Event, EventStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    let text = self.buf.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let result = serde_json::from_str(text).map_err(|error| {
                        EventStreamError::Parse {
                            line: self.line,
                            error,
                        }
                    });
                    self.done = result.is_err();
                    return Some(result);
                }
                Err(error) => {
                    self.done = true;
                    return Some(Err(EventStreamError::Read(error)));
                }
            }
        }
        None
    }
}

/// Runs every event in `reader` through `formatter`.
///
/// Feature documents are added to the formatter's index. If the stream ends without a
/// `test-run-finished` event, the run is finalized anyway.
pub fn run_stream<R, E>(
    reader: R,
    formatter: &mut TeamcityFormatter<E, FeatureIndex>,
) -> Result<(), RunStreamError>
where
    R: BufRead,
    E: ReportEmitter,
{
    let mut events = EventStream::new(reader);
    for event in &mut events {
        let event = event?;
        if let Event::GherkinDocument(document) = &event {
            debug!(uri = %document.uri, name = %document.feature_name, "registered feature");
            formatter
                .lookup_mut()
                .insert(document.uri.clone(), document.feature_name.clone());
            continue;
        }
        formatter.handle_event(&event)?;
    }

    if !formatter.is_finished() {
        warn!(
            "event stream ended after {} lines without test-run-finished, finalizing report",
            events.lines_read(),
        );
        formatter.on_test_run_finished()?;
    }
    Ok(())
}
