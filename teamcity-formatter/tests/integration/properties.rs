// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invariants that hold for any well-ordered event sequence.

use crate::helpers::*;
use proptest::{collection::vec, prelude::*};
use teamcity_formatter::events::{Event, ResultStatus, TestResult};
use test_strategy::proptest;

/// One test case instance: its feature and the outcome of each attempt the runner would make.
#[derive(Clone, Debug)]
struct Instance {
    feature_b: bool,
    attempts: Vec<bool>,
    steps: Vec<u8>,
}

fn instance() -> impl Strategy<Value = Instance> {
    (any::<bool>(), vec(any::<bool>(), 1..5), vec(0u8..4, 0..4)).prop_map(
        |(feature_b, attempts, steps)| Instance {
            feature_b,
            attempts,
            steps,
        },
    )
}

fn step_status(n: u8) -> ResultStatus {
    match n {
        0 => ResultStatus::Passed,
        1 => ResultStatus::Skipped,
        2 => ResultStatus::Failed,
        _ => ResultStatus::Undefined,
    }
}

/// Builds the events the runner would produce: attempts stop at the first pass or once the retry
/// budget is used up.
fn events_for(instances: &[Instance], budget: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for (line, instance) in instances.iter().enumerate() {
        let feature = if instance.feature_b { "b" } else { "a" };
        let test_case = case(feature, &format!("case {line}"), line as u32 + 1);
        for attempt in 0..=budget {
            // Attempts past the generated ones keep failing.
            let passes = instance.attempts.get(attempt).copied().unwrap_or(false);
            events.push(started(&test_case));
            for n in &instance.steps {
                events.push(step("Given a step", step_status(*n)));
            }
            let result = if passes {
                TestResult::passed()
            } else {
                failed(&format!("attempt {attempt}"))
            };
            events.push(finished(&test_case, result));
            if passes {
                break;
            }
        }
    }
    events.push(Event::TestRunFinished);
    events
}

#[proptest(cases = 64)]
fn reports_are_well_nested(
    #[strategy(vec(instance(), 0..8))] instances: Vec<Instance>,
    #[strategy(0usize..3)] budget: usize,
) {
    let mut formatter = formatter(false, budget);
    run(&mut formatter, &events_for(&instances, budget));
    let total = formatter.counts().scenarios.total();
    let reports = reports(formatter);

    let mut suite_open = false;
    let mut test_open = false;
    let mut failed_reports = 0;
    for (index, report) in reports.iter().enumerate() {
        match report {
            Report::SuiteStarted(_) => {
                assert!(!suite_open && !test_open, "suite opened at {index}");
                suite_open = true;
            }
            Report::SuiteFinished(_) => {
                assert!(suite_open && !test_open, "suite closed at {index}");
                suite_open = false;
            }
            Report::TestStarted(_) => {
                assert!(suite_open && !test_open, "test started at {index}");
                test_open = true;
            }
            Report::TestFailed(_, failures) => {
                assert!(test_open, "failure outside test at {index}");
                assert!((1..=budget + 1).contains(&failures.len()));
                failed_reports += 1;
            }
            Report::TestFinished(_) => {
                assert!(test_open, "test finished at {index}");
                test_open = false;
            }
            Report::Raw(_) => {}
        }
    }

    assert!(!suite_open && !test_open, "everything closed at end");
    assert!(
        matches!(reports.last(), Some(Report::Raw(summary)) if summary.contains("scenario")),
        "summary is written last"
    );
    assert!(failed_reports <= instances.len());
    assert_eq!(total, instances.len(), "one final attempt per instance");
}
