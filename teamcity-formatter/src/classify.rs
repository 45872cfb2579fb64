// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decide whether a result is a reportable failure.

use crate::{
    backtrace::BacktraceFilter,
    events::{Backtrace, FailureDetail, ResultStatus, TestResult},
};

/// Returns the failure detail to report for `result`, or `None` if the result is acceptable under
/// the given strictness.
///
/// A failed result reports the error it carries. Any other non-ok result (ambiguous, or pending
/// and undefined in strict mode) reports a detail synthesized from its status and message. The
/// backtrace is passed through `filter` in both cases.
pub fn failure_to_print(
    result: &TestResult,
    strict: bool,
    filter: &dyn BacktraceFilter,
) -> Option<FailureDetail> {
    if result.status.is_ok(strict) {
        return None;
    }

    let detail = match (&result.status, &result.exception) {
        (ResultStatus::Failed, Some(exception)) => FailureDetail {
            kind: exception.kind.clone(),
            message: exception.message.clone(),
            backtrace: filter.filter(&exception.backtrace),
        },
        (status, exception) => FailureDetail {
            kind: Some(status.title().to_owned()),
            message: result
                .message
                .clone()
                .or_else(|| exception.as_ref().map(|e| e.message.clone()))
                .unwrap_or_else(|| status.as_str().to_owned()),
            backtrace: exception
                .as_ref()
                .map_or_else(Backtrace::default, |e| filter.filter(&e.backtrace)),
        },
    };
    Some(detail)
}
