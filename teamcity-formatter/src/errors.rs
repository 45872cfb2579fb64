// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the formatter.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use teamcity_messages::SerializeError;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse cucumber-teamcity config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// The config layers could not be read or deserialized.
    #[error(transparent)]
    Build(ConfigError),

    /// A backtrace exclusion pattern is not a valid regular expression.
    #[error("invalid backtrace exclusion in profile `{profile}`")]
    InvalidBacktraceExclusion {
        /// The profile the pattern is declared in.
        profile: String,

        /// The regex error.
        #[source]
        error: regex::Error,
    },
}

/// An error which indicates that a profile was requested but not defined in the config.
#[derive(Clone, Debug, Error)]
#[error("profile `{profile}` not found (known profiles: {})", .all_profiles.join(", "))]
pub struct ProfileNotFound {
    profile: String,
    all_profiles: Vec<String>,
}

impl ProfileNotFound {
    pub(crate) fn new(
        profile: impl Into<String>,
        all_profiles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut all_profiles: Vec<_> = all_profiles.into_iter().map(|s| s.into()).collect();
        all_profiles.sort_unstable();
        Self {
            profile: profile.into(),
            all_profiles,
        }
    }

    /// Returns the requested profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Returns the names of all known profiles, sorted.
    pub fn all_profiles(&self) -> &[String] {
        &self.all_profiles
    }
}

/// An error that occurs while writing a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// A service message could not be serialized.
    #[error("error serializing TeamCity service message")]
    Serialize(#[source] SerializeError),
}

impl From<SerializeError> for WriteEventError {
    fn from(error: SerializeError) -> Self {
        // Unwrap I/O errors so callers see a single Io variant for broken pipes and the like.
        match error {
            SerializeError::Io(error) => WriteEventError::Io(error),
            other => WriteEventError::Serialize(other),
        }
    }
}

/// An error that occurs while translating events into a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// A test case belongs to a feature file that was never announced.
    #[error("no feature name known for `{uri}`")]
    UnknownFeature {
        /// The feature file of the test case.
        uri: Utf8PathBuf,
    },

    /// The report could not be written.
    #[error(transparent)]
    Write(#[from] WriteEventError),
}

/// An error that occurs while reading an event stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventStreamError {
    /// The input could not be read.
    #[error("error reading event stream")]
    Read(#[source] std::io::Error),

    /// A line of input is not a valid event.
    #[error("malformed event on line {line}")]
    Parse {
        /// The 1-based line number.
        line: usize,

        /// The underlying deserialization error.
        #[source]
        error: serde_json::Error,
    },
}

/// An error that occurs while running an event stream through a formatter.
#[derive(Debug, Error)]
pub enum RunStreamError {
    /// The event stream could not be read.
    #[error(transparent)]
    Stream(#[from] EventStreamError),

    /// An event could not be formatted.
    #[error(transparent)]
    Format(#[from] FormatError),
}
