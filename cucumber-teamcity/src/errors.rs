// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    exit_codes::CucumberTeamcityExitCode,
    output::{NO_HEADING_TARGET, StderrStyles},
};
use camino::{FromPathBufError, Utf8PathBuf};
use owo_colors::OwoColorize;
use std::error::Error;
use teamcity_formatter::errors::{
    ConfigParseError, EventStreamError, FormatError, ProfileNotFound, RunStreamError,
    WriteEventError,
};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error: a problem with the input or the environment, not a bug.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: FromPathBufError,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("profile not found")]
    ProfileNotFound {
        #[from]
        err: ProfileNotFound,
    },
    #[error("failed to open input file")]
    InputOpenFailed {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read input")]
    InputReadFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("malformed event stream")]
    EventStreamError {
        #[source]
        err: EventStreamError,
    },
    #[error("unknown feature")]
    UnknownFeature {
        #[source]
        err: FormatError,
    },
    #[error("failed to write report")]
    WriteError {
        #[source]
        err: WriteEventError,
    },
}

impl ExpectedError {
    pub(crate) fn from_run_stream(err: RunStreamError) -> Self {
        match err {
            RunStreamError::Stream(EventStreamError::Read(err)) => Self::InputReadFailed { err },
            RunStreamError::Stream(err) => Self::EventStreamError { err },
            RunStreamError::Format(FormatError::Write(err)) => Self::WriteError { err },
            RunStreamError::Format(err) => Self::UnknownFeature { err },
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ConfigParseError { .. }
            | Self::ProfileNotFound { .. }
            | Self::InputOpenFailed { .. } => CucumberTeamcityExitCode::SETUP_ERROR,
            Self::InputReadFailed { .. } => CucumberTeamcityExitCode::INPUT_READ_ERROR,
            Self::EventStreamError { .. } => CucumberTeamcityExitCode::MALFORMED_EVENT_STREAM,
            Self::UnknownFeature { .. } => CucumberTeamcityExitCode::UNKNOWN_FEATURE,
            Self::WriteError { .. } => CucumberTeamcityExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::ProfileNotFound { err } => {
                error!("{err}");
                err.source()
            }
            Self::InputOpenFailed { path, err } => {
                error!("failed to open input file `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::InputReadFailed { err } => {
                error!("failed to read test events");
                Some(err as &dyn Error)
            }
            Self::EventStreamError { err } => {
                error!("failed to read test events");
                Some(err as &dyn Error)
            }
            Self::UnknownFeature { err } => {
                error!("{err}");
                error!(
                    target: NO_HEADING_TARGET,
                    "(every feature file must be announced by a gherkin-document event before its test cases start)"
                );
                err.source()
            }
            Self::WriteError { err } => {
                error!("failed to write TeamCity report");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamcity_formatter::config::FormatterConfig;

    #[test]
    fn exit_codes() {
        let err = ExpectedError::from(
            FormatterConfig::default_config("/work")
                .profile(Some("missing"))
                .unwrap_err(),
        );
        assert_eq!(
            err.process_exit_code(),
            CucumberTeamcityExitCode::SETUP_ERROR
        );

        let err = ExpectedError::from_run_stream(RunStreamError::Format(
            FormatError::UnknownFeature {
                uri: "features/a.feature".into(),
            },
        ));
        assert_eq!(
            err.process_exit_code(),
            CucumberTeamcityExitCode::UNKNOWN_FEATURE
        );

        let err = ExpectedError::from_run_stream(RunStreamError::Format(FormatError::Write(
            WriteEventError::Io(std::io::Error::other("pipe closed")),
        )));
        assert_eq!(
            err.process_exit_code(),
            CucumberTeamcityExitCode::WRITE_OUTPUT_ERROR
        );

        let err = ExpectedError::from_run_stream(RunStreamError::Stream(EventStreamError::Read(
            std::io::Error::other("disk on fire"),
        )));
        assert!(
            matches!(err, ExpectedError::InputReadFailed { .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(
            err.process_exit_code(),
            CucumberTeamcityExitCode::INPUT_READ_ERROR
        );

        let parse_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ExpectedError::from_run_stream(RunStreamError::Stream(EventStreamError::Parse {
            line: 3,
            error: parse_error,
        }));
        assert_eq!(
            err.process_exit_code(),
            CucumberTeamcityExitCode::MALFORMED_EVENT_STREAM
        );
    }
}
