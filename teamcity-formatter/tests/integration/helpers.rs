// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;
use teamcity_formatter::{
    emitter::ReportEmitter,
    errors::WriteEventError,
    events::{
        Event, FailureDetail, Location, ResultStatus, TestCase, TestCaseFinished,
        TestCaseStarted, TestResult, TestStep, TestStepFinished,
    },
    formatter::{FormatterBuilder, TeamcityFormatter},
    lookup::FeatureIndex,
};

/// A report event, as recorded by [`RecordingEmitter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Report {
    SuiteStarted(String),
    SuiteFinished(String),
    TestStarted(String),
    TestFinished(String),
    TestFailed(String, Vec<FailureDetail>),
    Raw(String),
}

#[derive(Debug, Default)]
pub struct RecordingEmitter {
    pub reports: Vec<Report>,
}

impl ReportEmitter for RecordingEmitter {
    fn suite_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.reports.push(Report::SuiteStarted(name.to_owned()));
        Ok(())
    }

    fn suite_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.reports.push(Report::SuiteFinished(name.to_owned()));
        Ok(())
    }

    fn test_started(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.reports.push(Report::TestStarted(name.to_owned()));
        Ok(())
    }

    fn test_finished(&mut self, name: &str) -> Result<(), WriteEventError> {
        self.reports.push(Report::TestFinished(name.to_owned()));
        Ok(())
    }

    fn test_failed(
        &mut self,
        name: &str,
        failures: &[FailureDetail],
    ) -> Result<(), WriteEventError> {
        self.reports
            .push(Report::TestFailed(name.to_owned(), failures.to_vec()));
        Ok(())
    }

    fn raw_line(&mut self, text: &str) -> Result<(), WriteEventError> {
        self.reports.push(Report::Raw(text.to_owned()));
        Ok(())
    }
}

pub type RecordingFormatter = TeamcityFormatter<RecordingEmitter, FeatureIndex>;

/// Features `a.feature` ("A") and `b.feature` ("B").
pub fn features() -> FeatureIndex {
    [("features/a.feature", "A"), ("features/b.feature", "B")]
        .into_iter()
        .collect()
}

pub fn formatter(strict: bool, retry_budget: usize) -> RecordingFormatter {
    FormatterBuilder::new(strict, retry_budget).build(RecordingEmitter::default(), features())
}

/// A test case in `features/<feature>.feature`.
pub fn case(feature: &str, name: &str, line: u32) -> TestCase {
    TestCase::new(name, Location::new(format!("features/{feature}.feature"), line))
}

pub fn started(test_case: &TestCase) -> Event {
    Event::TestCaseStarted(TestCaseStarted {
        test_case: test_case.clone(),
    })
}

pub fn finished(test_case: &TestCase, result: TestResult) -> Event {
    Event::TestCaseFinished(TestCaseFinished {
        test_case: test_case.clone(),
        result,
    })
}

pub fn step(text: &str, status: ResultStatus) -> Event {
    Event::TestStepFinished(TestStepFinished {
        test_step: TestStep::new(text),
        result: TestResult::new(status).with_duration(Duration::from_millis(1)),
    })
}

pub fn failed(message: &str) -> TestResult {
    TestResult::failed(FailureDetail::new(message).with_kind("RuntimeError"))
}

pub fn run(formatter: &mut RecordingFormatter, events: &[Event]) {
    for event in events {
        formatter
            .handle_event(event)
            .unwrap_or_else(|err| panic!("handling {event:?} failed: {err}"));
    }
}

pub fn reports(formatter: RecordingFormatter) -> Vec<Report> {
    formatter.into_emitter().reports
}
