// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event-to-report translation engine.

use crate::{
    backtrace::{BacktraceFilter, PatternBacktraceFilter},
    classify::failure_to_print,
    counts::Counts,
    emitter::ReportEmitter,
    errors::FormatError,
    events::{Event, ResultStatus, TestCase, TestResult, TestStepFinished},
    lookup::FeatureLookup,
    retry::RetryAggregator,
    suite::{SuiteTracker, SuiteTransition},
};
use std::sync::Arc;
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// Builds a [`TeamcityFormatter`].
#[derive(Clone)]
pub struct FormatterBuilder {
    strict: bool,
    retry_budget: usize,
    backtrace_filter: Arc<dyn BacktraceFilter + Send + Sync>,
}

impl FormatterBuilder {
    /// Creates a new builder.
    ///
    /// In strict mode, pending and undefined results are reported as failures. `retry_budget` is
    /// the number of times the test runner retries a failing test case.
    pub fn new(strict: bool, retry_budget: usize) -> Self {
        Self {
            strict,
            retry_budget,
            backtrace_filter: Arc::new(PatternBacktraceFilter::with_default_exclusions()),
        }
    }

    /// Sets strict mode.
    pub fn set_strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Sets the retry budget.
    pub fn set_retry_budget(&mut self, retry_budget: usize) -> &mut Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Sets the policy used to trim backtraces of reported failures.
    pub fn set_backtrace_filter(
        &mut self,
        filter: Arc<dyn BacktraceFilter + Send + Sync>,
    ) -> &mut Self {
        self.backtrace_filter = filter;
        self
    }

    /// Creates a formatter that reports through `emitter` and names suites through `lookup`.
    pub fn build<E, L>(&self, emitter: E, lookup: L) -> TeamcityFormatter<E, L>
    where
        E: ReportEmitter,
        L: FeatureLookup,
    {
        TeamcityFormatter {
            emitter,
            lookup,
            strict: self.strict,
            backtrace_filter: self.backtrace_filter.clone(),
            suites: SuiteTracker::new(),
            retries: RetryAggregator::new(self.retry_budget),
            counts: Counts::new(),
            finished: false,
        }
    }
}

/// Translates test runner events into reports.
///
/// Handlers must be called in the order the events occurred. Each handler writes everything it
/// reports before returning.
pub struct TeamcityFormatter<E, L> {
    emitter: E,
    lookup: L,
    strict: bool,
    backtrace_filter: Arc<dyn BacktraceFilter + Send + Sync>,
    suites: SuiteTracker,
    retries: RetryAggregator,
    counts: Counts,
    finished: bool,
}

impl<E: ReportEmitter, L: FeatureLookup> TeamcityFormatter<E, L> {
    /// Dispatches an event to its handler.
    ///
    /// [`Event::GherkinDocument`] is ignored: feature names are resolved through the lookup.
    /// Events that arrive after the run has finished are ignored with a warning.
    pub fn handle_event(&mut self, event: &Event) -> Result<(), FormatError> {
        if self.finished && !matches!(event, Event::TestRunFinished) {
            warn!("ignoring {} event after the test run finished", event.kind());
            return Ok(());
        }
        match event {
            Event::GherkinDocument(_) => Ok(()),
            Event::TestCaseStarted(started) => self.on_test_case_started(&started.test_case),
            Event::TestCaseFinished(finished) => {
                self.on_test_case_finished(&finished.test_case, &finished.result)
            }
            Event::TestStepFinished(step) => self.on_test_step_finished(step),
            Event::TestRunFinished => self.on_test_run_finished(),
        }
    }

    /// Handles the start of a test case attempt.
    ///
    /// Opens a new suite if the test case belongs to a different feature file than the open
    /// suite. Fails with [`FormatError::UnknownFeature`] if the feature name can't be resolved, in
    /// which case nothing is written.
    pub fn on_test_case_started(&mut self, test_case: &TestCase) -> Result<(), FormatError> {
        match self.suites.on_case_started(test_case.uri(), &self.lookup)? {
            SuiteTransition::Unchanged => {}
            SuiteTransition::Switched { closed, opened } => {
                if let Some(closed) = closed {
                    self.emitter.suite_finished(&closed)?;
                }
                self.emitter.suite_started(&opened)?;
            }
        }
        self.emitter.test_started(&test_case.name)?;
        Ok(())
    }

    /// Handles the end of a test case attempt.
    pub fn on_test_case_finished(
        &mut self,
        test_case: &TestCase,
        result: &TestResult,
    ) -> Result<(), FormatError> {
        let failure = failure_to_print(result, self.strict, &*self.backtrace_filter);
        let outcome = self
            .retries
            .record(test_case.id(), result.status, failure);
        if let Some(status) = outcome.superseded {
            self.counts.record_scenario(status, false);
        }
        debug!(
            name = %test_case.name,
            status = %result.status,
            attempt = outcome.attempt,
            is_final = outcome.is_final,
            "test case finished"
        );

        if outcome.is_final {
            self.counts
                .record_scenario(result.status, outcome.is_flaky());
        }
        if let Some(failures) = outcome.report {
            self.emitter.test_failed(&test_case.name, failures)?;
        }
        self.emitter.test_finished(&test_case.name)?;
        Ok(())
    }

    /// Handles the end of a step. Skipped steps are counted but not written.
    pub fn on_test_step_finished(&mut self, event: &TestStepFinished) -> Result<(), FormatError> {
        let status = event.result.status;
        self.counts.record_step(status);
        if status == ResultStatus::Skipped {
            return Ok(());
        }

        let mut line = String::new();
        swrite!(line, "{} {}", status.symbol(), event.test_step);
        self.emitter.raw_line(&line)?;
        Ok(())
    }

    /// Handles the end of the run: closes the open suite and writes the counts summary.
    ///
    /// A test case whose last attempt was waiting on a retry is counted with that attempt's
    /// status.
    ///
    /// Calling this more than once writes nothing after the first call.
    pub fn on_test_run_finished(&mut self) -> Result<(), FormatError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        if let Some(status) = self.retries.finish() {
            self.counts.record_scenario(status, false);
        }
        if let Some(name) = self.suites.close() {
            self.emitter.suite_finished(&name)?;
        }
        self.emitter.raw_line(&self.counts.summary())?;
        Ok(())
    }
}

impl<E, L> TeamcityFormatter<E, L> {
    /// Returns the counts recorded so far.
    pub fn counts(&self) -> &Counts {
        &self.counts
    }

    /// Returns true if any test case finally failed.
    pub fn has_failures(&self) -> bool {
        self.counts.has_failures(self.strict)
    }

    /// Returns true once the run has been finalized.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the emitter.
    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    /// Returns the feature lookup.
    pub fn lookup_mut(&mut self) -> &mut L {
        &mut self.lookup
    }

    /// Consumes the formatter, returning the emitter.
    pub fn into_emitter(self) -> E {
        self.emitter
    }
}
