// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running tallies of scenario and step results.

use crate::events::ResultStatus;
use itertools::Itertools;
use std::fmt;

/// Scenario and step counts for a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    /// Counts of scenarios, by the status of their final attempt.
    pub scenarios: Tally,

    /// Counts of steps, across all attempts.
    pub steps: Tally,
}

impl Counts {
    /// Creates new, empty counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the final attempt of a scenario.
    ///
    /// A passing scenario that needed retries is counted as flaky instead of passed.
    pub fn record_scenario(&mut self, status: ResultStatus, flaky: bool) {
        if flaky && status == ResultStatus::Passed {
            self.scenarios.flaky += 1;
        } else {
            self.scenarios.add(status);
        }
    }

    /// Records a finished step.
    pub fn record_step(&mut self, status: ResultStatus) {
        self.steps.add(status);
    }

    /// Returns true if any scenario finally failed under the given strictness.
    pub fn has_failures(&self, strict: bool) -> bool {
        let s = &self.scenarios;
        s.failed > 0 || s.ambiguous > 0 || (strict && (s.pending > 0 || s.undefined > 0))
    }

    /// Returns a summary in the two-line format used by Cucumber's console output.
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}",
            TallySummary::new(&self.scenarios, "scenario"),
            TallySummary::new(&self.steps, "step"),
        )
    }
}

/// Counts for one kind of item, per status.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Passed items.
    pub passed: usize,
    /// Failed items.
    pub failed: usize,
    /// Pending items.
    pub pending: usize,
    /// Skipped items.
    pub skipped: usize,
    /// Undefined items.
    pub undefined: usize,
    /// Ambiguous items.
    pub ambiguous: usize,
    /// Items that passed after failing at least once. Only used for scenarios.
    pub flaky: usize,
}

impl Tally {
    fn add(&mut self, status: ResultStatus) {
        let slot = match status {
            ResultStatus::Passed => &mut self.passed,
            ResultStatus::Failed => &mut self.failed,
            ResultStatus::Pending => &mut self.pending,
            ResultStatus::Skipped => &mut self.skipped,
            ResultStatus::Undefined => &mut self.undefined,
            ResultStatus::Ambiguous => &mut self.ambiguous,
        };
        *slot += 1;
    }

    /// Returns the total number of items.
    pub fn total(&self) -> usize {
        self.passed
            + self.failed
            + self.pending
            + self.skipped
            + self.undefined
            + self.ambiguous
            + self.flaky
    }

    fn breakdown(&self) -> [(usize, &'static str); 7] {
        [
            (self.failed, "failed"),
            (self.ambiguous, "ambiguous"),
            (self.flaky, "flaky"),
            (self.skipped, "skipped"),
            (self.undefined, "undefined"),
            (self.pending, "pending"),
            (self.passed, "passed"),
        ]
    }
}

struct TallySummary<'a> {
    tally: &'a Tally,
    noun: &'static str,
}

impl<'a> TallySummary<'a> {
    fn new(tally: &'a Tally, noun: &'static str) -> Self {
        Self { tally, noun }
    }
}

impl fmt::Display for TallySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.tally.total();
        write!(f, "{total} {}", self.noun)?;
        if total != 1 {
            f.write_str("s")?;
        }
        if total > 0 {
            let parts = self
                .tally
                .breakdown()
                .into_iter()
                .filter(|(count, _)| *count > 0)
                .map(|(count, label)| format!("{count} {label}"))
                .join(", ");
            write!(f, " ({parts})")?;
        }
        Ok(())
    }
}
