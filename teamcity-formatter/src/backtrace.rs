// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backtrace filtering.
//!
//! Failures raised by step definitions carry backtraces that are mostly frames from the test
//! runner itself. A [`BacktraceFilter`] trims those before they are reported.

use crate::events::Backtrace;
use camino::Utf8PathBuf;
use regex::RegexSet;

/// The default exclusion patterns: frames from the test runner, its libraries and the language
/// runtime.
pub static DEFAULT_EXCLUSIONS: &[&str] = &[
    r"/cucumber/",
    r"/gherkin/",
    r"/rspec/",
    r"/minitest/",
    r"/ruby/gems/",
    r"<internal:",
    r"/bin/cucumber:",
    r"/lib/ruby/",
    r"/\.rbenv/",
    r"/\.rvm/",
];

/// A policy for trimming backtraces before they are reported.
pub trait BacktraceFilter {
    /// Returns the filtered backtrace.
    fn filter(&self, backtrace: &Backtrace) -> Backtrace;
}

impl<T: BacktraceFilter + ?Sized> BacktraceFilter for &T {
    fn filter(&self, backtrace: &Backtrace) -> Backtrace {
        (**self).filter(backtrace)
    }
}

/// A filter that keeps every frame.
#[derive(Copy, Clone, Debug, Default)]
pub struct FullBacktrace;

impl BacktraceFilter for FullBacktrace {
    fn filter(&self, backtrace: &Backtrace) -> Backtrace {
        backtrace.clone()
    }
}

/// A filter that drops frames matching any of a set of regular expressions.
#[derive(Clone, Debug)]
pub struct PatternBacktraceFilter {
    exclusions: RegexSet,
    working_dir: Option<String>,
}

impl PatternBacktraceFilter {
    /// Creates a new filter from exclusion patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            exclusions: RegexSet::new(patterns)?,
            working_dir: None,
        })
    }

    /// Creates a new filter with [`DEFAULT_EXCLUSIONS`].
    pub fn with_default_exclusions() -> Self {
        Self {
            exclusions: RegexSet::new(DEFAULT_EXCLUSIONS)
                .expect("default backtrace exclusions are valid regexes"),
            working_dir: None,
        }
    }

    /// Frames starting with this directory are rewritten to start with `./` instead.
    pub fn with_working_dir(mut self, working_dir: impl Into<Utf8PathBuf>) -> Self {
        let mut dir = working_dir.into().into_string();
        if !dir.ends_with('/') {
            dir.push('/');
        }
        self.working_dir = Some(dir);
        self
    }

    fn shorten(&self, frame: &str) -> String {
        match &self.working_dir {
            Some(dir) => match frame.strip_prefix(dir.as_str()) {
                Some(rest) => format!("./{rest}"),
                None => frame.to_owned(),
            },
            None => frame.to_owned(),
        }
    }
}

impl BacktraceFilter for PatternBacktraceFilter {
    fn filter(&self, backtrace: &Backtrace) -> Backtrace {
        let kept: Vec<&str> = backtrace
            .iter()
            .filter(|frame| !self.exclusions.is_match(frame))
            .collect();

        // Keep some location information even if every frame is internal.
        if kept.is_empty() {
            return backtrace.iter().map(|frame| self.shorten(frame)).collect();
        }
        kept.into_iter().map(|frame| self.shorten(frame)).collect()
    }
}
