// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `cucumber-teamcity`.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum CucumberTeamcityExitCode {}

impl CucumberTeamcityExitCode {
    /// The report was written and no scenario failed.
    pub const OK: i32 = 0;

    /// The report was written, and one or more scenarios finally failed.
    pub const SCENARIOS_FAILED: i32 = 100;

    /// A user issue happened while setting up: a bad config, an unknown profile or an unreadable
    /// input file.
    pub const SETUP_ERROR: i32 = 96;

    /// The event stream could not be read, e.g. because the input was closed with an error.
    pub const INPUT_READ_ERROR: i32 = 95;

    /// The event stream contained a line that is not a valid event.
    pub const MALFORMED_EVENT_STREAM: i32 = 97;

    /// A test case referred to a feature file that was never announced in the event stream.
    pub const UNKNOWN_FEATURE: i32 = 98;

    /// Writing the report to standard output produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 99;
}
