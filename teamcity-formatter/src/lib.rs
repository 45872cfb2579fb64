// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [cucumber-teamcity](https://crates.io/crates/cucumber-teamcity).
//!
//! The main type here is [`TeamcityFormatter`](formatter::TeamcityFormatter), which consumes the
//! lifecycle events of a behavior-driven test run and renders them through a
//! [`ReportEmitter`](emitter::ReportEmitter) as TeamCity service messages. Along the way it:
//!
//! * groups scenarios into one TeamCity suite per feature file,
//! * holds back failures until a scenario has used up its retries, then reports every failed
//!   attempt at once, and
//! * decides whether pending and undefined results count as failures.

pub mod backtrace;
pub mod classify;
pub mod config;
pub mod counts;
pub mod emitter;
pub mod errors;
pub mod events;
pub mod formatter;
pub mod lookup;
pub mod retry;
pub mod stream;
pub mod suite;
