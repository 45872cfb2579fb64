// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolve feature files to their display names.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Resolves the display name of a feature file.
pub trait FeatureLookup {
    /// Returns the name of the feature declared in `uri`, or `None` if the file is unknown.
    fn feature_name(&self, uri: &Utf8Path) -> Option<&str>;
}

impl<T: FeatureLookup + ?Sized> FeatureLookup for &T {
    fn feature_name(&self, uri: &Utf8Path) -> Option<&str> {
        (**self).feature_name(uri)
    }
}

/// An in-memory index of feature names, in the order features were announced.
#[derive(Clone, Debug, Default)]
pub struct FeatureIndex {
    features: IndexMap<Utf8PathBuf, String>,
}

impl FeatureIndex {
    /// Creates a new, empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the name of the feature in `uri`, replacing any previous name.
    pub fn insert(&mut self, uri: impl Into<Utf8PathBuf>, name: impl Into<String>) {
        self.features.insert(uri.into(), name.into());
    }

    /// Returns the number of known features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if no features are known.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates over known features in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, &str)> {
        self.features
            .iter()
            .map(|(uri, name)| (uri.as_path(), name.as_str()))
    }
}

impl FeatureLookup for FeatureIndex {
    fn feature_name(&self, uri: &Utf8Path) -> Option<&str> {
        self.features.get(uri).map(|name| name.as_str())
    }
}

impl<U: Into<Utf8PathBuf>, N: Into<String>> FromIterator<(U, N)> for FeatureIndex {
    fn from_iter<I: IntoIterator<Item = (U, N)>>(iter: I) -> Self {
        Self {
            features: iter
                .into_iter()
                .map(|(uri, name)| (uri.into(), name.into()))
                .collect(),
        }
    }
}
