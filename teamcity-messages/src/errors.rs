// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::io;
use thiserror::Error;

/// An error that occurs while serializing a [`ServiceMessage`](crate::ServiceMessage).
///
/// Returned by [`ServiceMessage::serialize`](crate::ServiceMessage::serialize) and
/// [`ServiceMessage::to_line`](crate::ServiceMessage::to_line).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// The message name is not a valid identifier.
    #[error("invalid service message name `{name}`")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// An attribute name is not a valid identifier.
    #[error("invalid attribute name `{attribute}` in service message `{message}`")]
    InvalidAttributeName {
        /// The name of the message the attribute belongs to.
        message: String,

        /// The rejected attribute name.
        attribute: String,
    },

    /// A single-value message had a flow ID or timestamp set.
    ///
    /// The `##teamcity[name 'value']` form has no room for extra attributes.
    #[error("single-value service message `{name}` cannot carry a flow ID or timestamp")]
    SingleValueWithAttributes {
        /// The name of the message.
        name: String,
    },

    /// An error occurred while writing to the output.
    #[error("error writing service message")]
    Io(#[from] io::Error),
}
