// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping of test cases into one suite per feature file.

use crate::{errors::FormatError, lookup::FeatureLookup};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// Tracks the currently open suite.
///
/// Suites are inferred from event order: a suite opens when a test case from a new feature file
/// starts and closes when a test case from a different file starts or the run ends. A feature file
/// whose test cases are not contiguous therefore produces more than one suite.
#[derive(Clone, Debug, Default)]
pub struct SuiteTracker {
    state: SuiteState,
}

#[derive(Clone, Debug, Default)]
enum SuiteState {
    #[default]
    Closed,
    Open {
        uri: Utf8PathBuf,
        name: String,
    },
}

/// What happened to the open suite when a test case started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuiteTransition {
    /// The test case belongs to the open suite.
    Unchanged,

    /// A new suite was opened, closing the previous one if there was one.
    Switched {
        /// The name of the suite that was closed.
        closed: Option<String>,

        /// The name of the suite that was opened.
        opened: String,
    },
}

impl SuiteTracker {
    /// Creates a new tracker with no open suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name of the open suite, if any.
    pub fn current(&self) -> Option<&str> {
        match &self.state {
            SuiteState::Open { name, .. } => Some(name),
            SuiteState::Closed => None,
        }
    }

    /// Updates the open suite for a test case from `uri`.
    ///
    /// Returns an error, leaving the tracker unchanged, if `uri` is not known to `lookup`.
    pub fn on_case_started(
        &mut self,
        uri: &Utf8Path,
        lookup: &dyn FeatureLookup,
    ) -> Result<SuiteTransition, FormatError> {
        if let SuiteState::Open { uri: open, .. } = &self.state
            && open == uri
        {
            return Ok(SuiteTransition::Unchanged);
        }

        let opened = lookup
            .feature_name(uri)
            .ok_or_else(|| FormatError::UnknownFeature {
                uri: uri.to_owned(),
            })?
            .to_owned();
        debug!(%uri, feature = %opened, "switching suite");

        let closed = self.close();
        self.state = SuiteState::Open {
            uri: uri.to_owned(),
            name: opened.clone(),
        };
        Ok(SuiteTransition::Switched { closed, opened })
    }

    /// Closes the open suite, returning its name. Returns `None` if no suite is open.
    pub fn close(&mut self) -> Option<String> {
        match std::mem::take(&mut self.state) {
            SuiteState::Open { name, .. } => Some(name),
            SuiteState::Closed => None,
        }
    }
}
