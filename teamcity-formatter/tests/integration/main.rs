// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the formatter, driven through a recording emitter.

mod helpers;
mod properties;

use helpers::*;
use pretty_assertions::assert_eq;
use teamcity_formatter::{
    errors::FormatError,
    events::{Event, FailureDetail, ResultStatus, TestResult},
};

#[test]
fn suites_follow_feature_changes() {
    let a1 = case("a", "a1", 1);
    let a2 = case("a", "a2", 2);
    let b1 = case("b", "b1", 1);
    let b2 = case("b", "b2", 2);
    let a3 = case("a", "a3", 3);

    let mut formatter = formatter(false, 0);
    let mut events = Vec::new();
    for test_case in [&a1, &a2, &b1, &b2, &a3] {
        events.push(started(test_case));
        events.push(finished(test_case, TestResult::passed()));
    }
    events.push(Event::TestRunFinished);
    run(&mut formatter, &events);

    let suites: Vec<_> = reports(formatter)
        .into_iter()
        .filter(|report| matches!(report, Report::SuiteStarted(_) | Report::SuiteFinished(_)))
        .collect();
    assert_eq!(
        suites,
        vec![
            Report::SuiteStarted("A".to_owned()),
            Report::SuiteFinished("A".to_owned()),
            Report::SuiteStarted("B".to_owned()),
            Report::SuiteFinished("B".to_owned()),
            Report::SuiteStarted("A".to_owned()),
            Report::SuiteFinished("A".to_owned()),
        ],
        "a non-contiguous feature opens a second suite"
    );
}

#[test]
fn retries_are_reported_once() {
    let test_case = case("a", "flaky network", 7);
    let mut formatter = formatter(false, 2);
    run(
        &mut formatter,
        &[
            started(&test_case),
            finished(&test_case, failed("attempt 0")),
            started(&test_case),
            finished(&test_case, failed("attempt 1")),
            started(&test_case),
            finished(&test_case, failed("attempt 2")),
            Event::TestRunFinished,
        ],
    );
    assert!(formatter.has_failures());
    assert_eq!(
        formatter.counts().summary(),
        "1 scenario (1 failed)\n0 steps"
    );

    let reports = reports(formatter);
    let failures: Vec<_> = reports
        .iter()
        .filter_map(|report| match report {
            Report::TestFailed(name, failures) => Some((name.as_str(), failures.len())),
            _ => None,
        })
        .collect();
    assert_eq!(failures, [("flaky network", 3)]);

    let started = reports
        .iter()
        .filter(|report| matches!(report, Report::TestStarted(_)))
        .count();
    let finished = reports
        .iter()
        .filter(|report| matches!(report, Report::TestFinished(_)))
        .count();
    assert_eq!((started, finished), (3, 3), "every attempt starts and finishes");
}

#[test]
fn recovered_retry_is_not_reported() {
    let test_case = case("a", "eventually passes", 3);
    let mut formatter = formatter(false, 2);
    run(
        &mut formatter,
        &[
            started(&test_case),
            finished(&test_case, failed("first try")),
            started(&test_case),
            finished(&test_case, TestResult::passed()),
            Event::TestRunFinished,
        ],
    );
    assert!(!formatter.has_failures());

    let reports = reports(formatter);
    assert!(
        !reports
            .iter()
            .any(|report| matches!(report, Report::TestFailed(..))),
        "no failure reported: {reports:?}"
    );
    assert_eq!(
        reports.last(),
        Some(&Report::Raw(
            "1 scenario (1 flaky)\n0 steps".to_owned()
        ))
    );
}

#[test]
fn strict_mode_reports_undefined() {
    let test_case = case("b", "missing step", 4);
    let result = TestResult::new(ResultStatus::Undefined);
    let events = [
        started(&test_case),
        step("Given something nobody wrote", ResultStatus::Undefined),
        finished(&test_case, result),
        Event::TestRunFinished,
    ];

    let mut lenient = formatter(false, 0);
    run(&mut lenient, &events);
    assert!(!lenient.has_failures());
    assert!(
        !reports(lenient)
            .iter()
            .any(|report| matches!(report, Report::TestFailed(..)))
    );

    let mut strict = formatter(true, 0);
    run(&mut strict, &events);
    assert!(strict.has_failures());
    let failed: Vec<_> = reports(strict)
        .into_iter()
        .filter(|report| matches!(report, Report::TestFailed(..)))
        .collect();
    assert_eq!(
        failed,
        vec![Report::TestFailed(
            "missing step".to_owned(),
            vec![FailureDetail::new("undefined").with_kind("Undefined")]
        )]
    );
}

#[test]
fn ambiguous_fails_without_strict() {
    let test_case = case("a", "two definitions", 9);
    let mut formatter = formatter(false, 0);
    run(
        &mut formatter,
        &[
            started(&test_case),
            finished(
                &test_case,
                TestResult::new(ResultStatus::Ambiguous).with_message("2 step definitions match"),
            ),
        ],
    );
    assert!(formatter.has_failures());
    assert!(reports(formatter).contains(&Report::TestFailed(
        "two definitions".to_owned(),
        vec![FailureDetail::new("2 step definitions match").with_kind("Ambiguous")]
    )));
}

#[test]
fn unretried_strict_pending_is_counted() {
    // The runner only retries failed results, so a pending attempt is followed by the next case.
    let pending = case("a", "not yet", 1);
    let passing = case("a", "done", 2);
    let mut formatter = formatter(true, 1);
    run(
        &mut formatter,
        &[
            started(&pending),
            finished(&pending, TestResult::new(ResultStatus::Pending)),
            started(&passing),
            finished(&passing, TestResult::passed()),
            Event::TestRunFinished,
        ],
    );
    assert!(formatter.has_failures());
    assert_eq!(formatter.counts().scenarios.total(), 2);
    assert_eq!(
        formatter.counts().summary(),
        "2 scenarios (1 pending, 1 passed)\n0 steps"
    );
}

#[test]
fn run_ending_mid_retry_is_counted() {
    let test_case = case("b", "cut short", 5);
    let mut formatter = formatter(false, 3);
    run(
        &mut formatter,
        &[
            started(&test_case),
            finished(&test_case, failed("attempt 0")),
            Event::TestRunFinished,
        ],
    );
    assert!(formatter.has_failures());
    assert_eq!(
        formatter.counts().summary(),
        "1 scenario (1 failed)\n0 steps"
    );
}

#[test]
fn events_after_run_finished_are_ignored() {
    let early = case("a", "early", 1);
    let late = case("b", "late", 1);
    let mut formatter = formatter(false, 0);
    run(
        &mut formatter,
        &[
            started(&early),
            finished(&early, TestResult::passed()),
            Event::TestRunFinished,
            started(&late),
            step("Given a late step", ResultStatus::Passed),
            finished(&late, failed("too late")),
        ],
    );
    assert!(!formatter.has_failures());
    assert_eq!(
        reports(formatter),
        [
            Report::SuiteStarted("A".to_owned()),
            Report::TestStarted("early".to_owned()),
            Report::TestFinished("early".to_owned()),
            Report::SuiteFinished("A".to_owned()),
            Report::Raw("1 scenario (1 passed)\n0 steps".to_owned()),
        ]
    );
}

#[test]
fn run_finished_is_idempotent() {
    let test_case = case("a", "only", 1);
    let mut formatter = formatter(false, 0);
    run(
        &mut formatter,
        &[
            started(&test_case),
            finished(&test_case, TestResult::passed()),
            Event::TestRunFinished,
        ],
    );
    let once = formatter.emitter_mut().reports.clone();
    formatter.on_test_run_finished().unwrap();
    assert_eq!(reports(formatter), once);
    assert_eq!(
        &once[once.len() - 2..],
        [
            Report::SuiteFinished("A".to_owned()),
            Report::Raw("1 scenario (1 passed)\n0 steps".to_owned()),
        ]
    );
}

#[test]
fn skipped_steps_are_not_written() {
    let test_case = case("a", "steps", 1);
    let mut formatter = formatter(false, 0);
    run(
        &mut formatter,
        &[
            started(&test_case),
            step("Given one", ResultStatus::Passed),
            step("And two", ResultStatus::Passed),
            step("When three", ResultStatus::Skipped),
            step("Then four", ResultStatus::Pending),
            step("And five", ResultStatus::Failed),
            finished(&test_case, failed("five")),
            Event::TestRunFinished,
        ],
    );
    let raw: Vec<_> = reports(formatter)
        .into_iter()
        .filter_map(|report| match report {
            Report::Raw(text) => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(
        raw,
        [
            "✓ Given one",
            "✓ And two",
            "P Then four",
            "✗ And five",
            "1 scenario (1 failed)\n5 steps (1 failed, 1 skipped, 1 pending, 2 passed)",
        ]
    );
}

#[test]
fn unknown_feature_is_an_error() {
    let test_case = case("missing", "orphan", 1);
    let mut formatter = formatter(false, 0);
    let err = formatter.handle_event(&started(&test_case)).unwrap_err();
    assert!(
        matches!(&err, FormatError::UnknownFeature { uri } if uri == "features/missing.feature"),
        "unexpected error: {err:?}"
    );
    assert_eq!(err.to_string(), "no feature name known for `features/missing.feature`");
    assert!(reports(formatter).is_empty());
}
