// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events produced by a behavior-driven test runner.
//!
//! Events are read from a newline-delimited JSON stream by [`EventStream`](crate::stream::EventStream)
//! and consumed by a [`TeamcityFormatter`](crate::formatter::TeamcityFormatter).

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::{fmt, time::Duration};

/// A single event in a test run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// A feature file was parsed.
    ///
    /// Provides the display name for the suite of every test case whose location points at `uri`.
    GherkinDocument(GherkinDocument),

    /// A test case started running.
    TestCaseStarted(TestCaseStarted),

    /// A test case finished running.
    ///
    /// A retried test case produces one of these events per attempt.
    TestCaseFinished(TestCaseFinished),

    /// A test step finished running.
    TestStepFinished(TestStepFinished),

    /// The test run finished.
    TestRunFinished,
}

impl Event {
    /// Returns the name of this event as it appears in the event stream.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::GherkinDocument(_) => "gherkin-document",
            Event::TestCaseStarted(_) => "test-case-started",
            Event::TestCaseFinished(_) => "test-case-finished",
            Event::TestStepFinished(_) => "test-step-finished",
            Event::TestRunFinished => "test-run-finished",
        }
    }
}

/// A parsed feature file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GherkinDocument {
    /// The path to the feature file.
    pub uri: Utf8PathBuf,

    /// The name of the feature declared in the file.
    pub feature_name: String,
}

/// Payload of [`Event::TestCaseStarted`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCaseStarted {
    /// The test case that started.
    pub test_case: TestCase,
}

/// Payload of [`Event::TestCaseFinished`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCaseFinished {
    /// The test case that finished.
    pub test_case: TestCase,

    /// The result of this attempt.
    pub result: TestResult,
}

/// Payload of [`Event::TestStepFinished`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestStepFinished {
    /// The step that finished.
    pub test_step: TestStep,

    /// The result of the step.
    pub result: TestResult,
}

/// A location within a feature file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Location {
    /// The path to the feature file.
    pub uri: Utf8PathBuf,

    /// The 1-based line number.
    pub line: u32,
}

impl Location {
    /// Creates a new location.
    pub fn new(uri: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            uri: uri.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uri, self.line)
    }
}

/// A scenario or scenario outline example.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    /// The display name of the test case.
    pub name: String,

    /// Where the test case is declared.
    pub location: Location,
}

impl TestCase {
    /// Creates a new test case.
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Returns the feature file this test case belongs to.
    pub fn uri(&self) -> &Utf8Path {
        &self.location.uri
    }

    /// Returns the identity of this test case.
    pub fn id(&self) -> CaseId {
        CaseId {
            uri: self.location.uri.clone(),
            line: self.location.line,
            name: self.name.clone(),
        }
    }
}

/// The identity of a test case: feature file, line and name.
///
/// Two [`TestCase`] values describe the same test case if and only if their IDs are equal. This
/// is how retries of a test case are recognized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId {
    uri: Utf8PathBuf,
    line: u32,
    name: String,
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.uri, self.line, self.name)
    }
}

/// A step within a test case.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestStep {
    /// The step text, including its keyword, e.g. `Given a user`.
    pub text: String,

    /// Where the step is declared, if known.
    #[serde(default)]
    pub location: Option<Location>,
}

impl TestStep {
    /// Creates a new test step.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: None,
        }
    }
}

impl fmt::Display for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The outcome of a test case attempt or a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
pub enum ResultStatus {
    /// Everything passed.
    Passed,

    /// A step raised an error or an assertion failed.
    Failed,

    /// A step is marked as pending.
    Pending,

    /// The step was not run, typically because an earlier step did not pass.
    Skipped,

    /// No step definition matched the step.
    Undefined,

    /// More than one step definition matched the step.
    Ambiguous,
}

impl ResultStatus {
    /// Returns true if this status is acceptable under the given strictness.
    ///
    /// In strict mode, pending and undefined results are treated as failures.
    pub fn is_ok(self, strict: bool) -> bool {
        match self {
            ResultStatus::Passed | ResultStatus::Skipped => true,
            ResultStatus::Pending | ResultStatus::Undefined => !strict,
            ResultStatus::Failed | ResultStatus::Ambiguous => false,
        }
    }

    /// Returns the single-character symbol used for this status in step output.
    pub fn symbol(self) -> &'static str {
        match self {
            ResultStatus::Passed => "✓",
            ResultStatus::Failed => "✗",
            ResultStatus::Pending => "P",
            ResultStatus::Skipped => "-",
            ResultStatus::Undefined => "?",
            ResultStatus::Ambiguous => "A",
        }
    }

    /// Returns the lowercase name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatus::Passed => "passed",
            ResultStatus::Failed => "failed",
            ResultStatus::Pending => "pending",
            ResultStatus::Skipped => "skipped",
            ResultStatus::Undefined => "undefined",
            ResultStatus::Ambiguous => "ambiguous",
        }
    }

    /// Returns the capitalized name of this status, used as a failure kind.
    pub fn title(self) -> &'static str {
        match self {
            ResultStatus::Passed => "Passed",
            ResultStatus::Failed => "Failed",
            ResultStatus::Pending => "Pending",
            ResultStatus::Skipped => "Skipped",
            ResultStatus::Undefined => "Undefined",
            ResultStatus::Ambiguous => "Ambiguous",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of a test case attempt or a step.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TestResult {
    /// The outcome.
    pub status: ResultStatus,

    /// A message attached to a non-passing result, e.g. the reason a step is pending.
    #[serde(default)]
    pub message: Option<String>,

    /// The error raised by a failing result.
    #[serde(default)]
    pub exception: Option<FailureDetail>,

    /// How long the attempt or step took, in humantime format (e.g. `"12ms"`).
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
}

impl TestResult {
    /// Creates a new result with the given status and nothing else.
    pub fn new(status: ResultStatus) -> Self {
        Self {
            status,
            message: None,
            exception: None,
            duration: None,
        }
    }

    /// Creates a passing result.
    pub fn passed() -> Self {
        Self::new(ResultStatus::Passed)
    }

    /// Creates a failing result carrying the given error.
    pub fn failed(exception: FailureDetail) -> Self {
        Self {
            exception: Some(exception),
            ..Self::new(ResultStatus::Failed)
        }
    }

    /// Sets the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// An error raised by a failing test case or step.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FailureDetail {
    /// The kind of error, typically an exception class name such as `RuntimeError`.
    #[serde(default)]
    pub kind: Option<String>,

    /// The error message.
    pub message: String,

    /// Where the error was raised.
    #[serde(default)]
    pub backtrace: Backtrace,
}

impl FailureDetail {
    /// Creates a new failure detail with no kind and an empty backtrace.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
            backtrace: Backtrace::default(),
        }
    }

    /// Sets the kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the backtrace.
    pub fn with_backtrace(mut self, backtrace: impl Into<Backtrace>) -> Self {
        self.backtrace = backtrace.into();
        self
    }
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// An ordered list of backtrace frames, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Backtrace {
    frames: Vec<String>,
}

impl Backtrace {
    /// Creates a new backtrace from frames.
    pub fn new(frames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        frames.into_iter().collect()
    }

    /// Returns the frames.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Returns true if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns the number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Iterates over the frames.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for Backtrace {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<String>> for Backtrace {
    fn from(frames: Vec<String>) -> Self {
        Self { frames }
    }
}

impl<const N: usize> From<[&str; N]> for Backtrace {
    fn from(frames: [&str; N]) -> Self {
        frames.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use test_case::test_case;

    #[test_case(ResultStatus::Passed, false, true ; "passed lenient")]
    #[test_case(ResultStatus::Passed, true, true ; "passed strict")]
    #[test_case(ResultStatus::Skipped, true, true ; "skipped strict")]
    #[test_case(ResultStatus::Pending, false, true ; "pending lenient")]
    #[test_case(ResultStatus::Pending, true, false ; "pending strict")]
    #[test_case(ResultStatus::Undefined, false, true ; "undefined lenient")]
    #[test_case(ResultStatus::Undefined, true, false ; "undefined strict")]
    #[test_case(ResultStatus::Failed, false, false ; "failed lenient")]
    #[test_case(ResultStatus::Ambiguous, false, false ; "ambiguous lenient")]
    fn status_is_ok(status: ResultStatus, strict: bool, expected: bool) {
        assert_eq!(status.is_ok(strict), expected);
    }

    #[test]
    fn case_identity_is_by_value() {
        let a = TestCase::new("Login", Location::new("features/login.feature", 3));
        let b = TestCase::new("Login", Location::new("features/login.feature", 3));
        let other_line = TestCase::new("Login", Location::new("features/login.feature", 9));
        let other_name = TestCase::new("Logout", Location::new("features/login.feature", 3));

        assert_eq!(a.id(), b.id(), "structurally equal cases share an identity");
        assert_ne!(a.id(), other_line.id());
        assert_ne!(a.id(), other_name.id());
    }

    #[test]
    fn deserialize_events() {
        let input = indoc! {r#"
            {"event":"gherkin-document","uri":"features/a.feature","feature-name":"A"}
            {"event":"test-case-started","test-case":{"name":"S","location":{"uri":"features/a.feature","line":3}}}
            {"event":"test-step-finished","test-step":{"text":"Given x"},"result":{"status":"undefined","message":"no step"}}
            {"event":"test-case-finished","test-case":{"name":"S","location":{"uri":"features/a.feature","line":3}},"result":{"status":"failed","duration":"12ms","exception":{"kind":"RuntimeError","message":"boom","backtrace":["a.rb:1"]}}}
            {"event":"test-run-finished"}
        "#};

        let events: Vec<Event> = input
            .lines()
            .map(|line| serde_json::from_str(line).expect("event parses"))
            .collect();
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            [
                "gherkin-document",
                "test-case-started",
                "test-step-finished",
                "test-case-finished",
                "test-run-finished",
            ]
        );

        let test_case = TestCase::new("S", Location::new("features/a.feature", 3));
        assert_eq!(
            events,
            vec![
                Event::GherkinDocument(GherkinDocument {
                    uri: "features/a.feature".into(),
                    feature_name: "A".to_owned(),
                }),
                Event::TestCaseStarted(TestCaseStarted {
                    test_case: test_case.clone(),
                }),
                Event::TestStepFinished(TestStepFinished {
                    test_step: TestStep::new("Given x"),
                    result: TestResult::new(ResultStatus::Undefined).with_message("no step"),
                }),
                Event::TestCaseFinished(TestCaseFinished {
                    test_case,
                    result: TestResult::failed(
                        FailureDetail::new("boom")
                            .with_kind("RuntimeError")
                            .with_backtrace(["a.rb:1"]),
                    )
                    .with_duration(Duration::from_millis(12)),
                }),
                Event::TestRunFinished,
            ]
        );
    }
}
