// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of failures across retries of a test case.
//!
//! The test runner reports every attempt of a retried test case as a separate finished event,
//! back to back. Failures are held back until the retry budget is exhausted, and then every
//! failed attempt is reported together.

use crate::events::{CaseId, FailureDetail, ResultStatus};
use tracing::debug;

/// Tracks the attempts of the most recently finished test case.
#[derive(Clone, Debug)]
pub struct RetryAggregator {
    budget: usize,
    state: RetryState,
}

#[derive(Clone, Debug)]
enum RetryState {
    Idle,
    Tracking {
        case: CaseId,
        attempt: usize,
        failures: Vec<FailureDetail>,
        // Status of the last attempt, kept while that attempt is not final.
        unsettled: Option<ResultStatus>,
    },
}

impl RetryAggregator {
    /// Creates a new aggregator with the given retry budget.
    ///
    /// A budget of `n` allows `n` retries after the first attempt, so a failure is only reported
    /// once attempt `n` (counting from 0) has failed.
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            state: RetryState::Idle,
        }
    }

    /// Returns the retry budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Records a finished attempt of `case` with the given status.
    ///
    /// `failure` is the classified failure of this attempt, if any.
    pub fn record(
        &mut self,
        case: CaseId,
        status: ResultStatus,
        failure: Option<FailureDetail>,
    ) -> AttemptOutcome<'_> {
        let (case, attempt, mut failures, superseded) =
            match std::mem::replace(&mut self.state, RetryState::Idle) {
                RetryState::Tracking {
                    case: prev,
                    attempt,
                    failures,
                    ..
                } if prev == case => (prev, attempt + 1, failures, None),
                RetryState::Tracking { unsettled, .. } => (case, 0, Vec::new(), unsettled),
                RetryState::Idle => (case, 0, Vec::new(), None),
            };

        let failed = failure.is_some();
        if let Some(failure) = failure {
            failures.push(failure);
        }
        let exhausted = attempt >= self.budget;
        let is_final = !failed || exhausted;
        debug!(
            %case,
            attempt,
            failed,
            exhausted,
            "recorded attempt"
        );

        self.state = RetryState::Tracking {
            case,
            attempt,
            failures,
            unsettled: (!is_final).then_some(status),
        };
        let failures = match &self.state {
            RetryState::Tracking { failures, .. } => failures.as_slice(),
            RetryState::Idle => &[],
        };

        AttemptOutcome {
            attempt,
            failed,
            is_final,
            report: (failed && exhausted).then_some(failures),
            superseded,
        }
    }

    /// Ends tracking, returning the status of the last attempt if the test runner never followed
    /// it up with a retry.
    pub fn finish(&mut self) -> Option<ResultStatus> {
        match std::mem::replace(&mut self.state, RetryState::Idle) {
            RetryState::Tracking { unsettled, .. } => unsettled,
            RetryState::Idle => None,
        }
    }
}

/// The outcome of [`RetryAggregator::record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptOutcome<'a> {
    /// The attempt number, counting from 0.
    pub attempt: usize,

    /// Whether this attempt produced a reportable failure.
    pub failed: bool,

    /// Whether this is the last attempt the test runner will make for this test case.
    ///
    /// An attempt is final if it did not fail or if the retry budget is used up.
    pub is_final: bool,

    /// The failures to report, one per failed attempt, if this attempt is a final failure.
    pub report: Option<&'a [FailureDetail]>,

    /// The status of the previous test case's last attempt, if that attempt expected a retry that
    /// never came.
    ///
    /// The test runner only retries some failures, so a non-final attempt can turn out to be the
    /// last one.
    pub superseded: Option<ResultStatus>,
}

impl AttemptOutcome<'_> {
    /// Returns true if this is a final passing attempt that follows a failed one.
    pub fn is_flaky(&self) -> bool {
        self.is_final && !self.failed && self.attempt > 0
    }
}
