// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate TeamCity service messages in Rust.
//!
//! A service message is a single line of the form `##teamcity[name key='value' ...]` written to a
//! build log. TeamCity parses these lines to build its test tree and report failures.

#![warn(missing_docs)]

mod errors;
mod message;
mod serialize;

pub use errors::*;
pub use message::*;
