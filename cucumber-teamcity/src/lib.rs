// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report behavior-driven test runs to TeamCity.
//!
//! `cucumber-teamcity` reads the events of a test run, one JSON object per line, and writes
//! TeamCity service messages to standard output. Each feature file becomes a TeamCity suite and
//! each scenario a test.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod exit_codes;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::CucumberTeamcityExitCode;
pub use output::{OutputContext, StderrStyles};
