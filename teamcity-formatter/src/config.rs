// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the formatter.
//!
//! The configuration is layered: the default config embedded in this crate comes first, followed
//! by a user config file. Each named profile inherits any settings it doesn't set from the
//! default profile.

use crate::{
    backtrace::{BacktraceFilter, FullBacktrace, PatternBacktraceFilter},
    errors::{ConfigParseError, ConfigParseErrorKind, ProfileNotFound},
    formatter::FormatterBuilder,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::warn;

/// Overall configuration for the formatter.
///
/// This is the root data structure for the formatter configuration. Most runs will use
/// [`profile`](Self::profile) to pick a set of settings.
#[derive(Clone, Debug)]
pub struct FormatterConfig {
    config_file: Utf8PathBuf,
    default_profile: DefaultProfileImpl,
    other_profiles: BTreeMap<String, CustomProfileImpl>,
}

impl FormatterConfig {
    /// The default location of the config within the working directory: `.config/cucumber-teamcity.toml`.
    pub const CONFIG_PATH: &'static str = ".config/cucumber-teamcity.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The name of the default profile.
    pub const DEFAULT_PROFILE: &'static str = "default";

    /// Reads the config from the embedded default config and, if present, a user config file.
    ///
    /// If `config_file` is `None`, [`CONFIG_PATH`](Self::CONFIG_PATH) within `working_dir` is read
    /// if it exists. Backtrace frames under `working_dir` are shortened to start with `./`.
    pub fn from_sources(
        working_dir: impl AsRef<Utf8Path>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let working_dir = working_dir.as_ref();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = working_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warn!(
                "ignoring unknown configuration keys in {config_file}: {}",
                unknown.iter().join(", ")
            );
        }

        Self::from_deserialized(config_file, working_dir, deserialized)
    }

    /// Returns the default config, with backtraces shortened relative to `working_dir`.
    pub fn default_config(working_dir: impl AsRef<Utf8Path>) -> Self {
        let config = Self::make_default_config()
            .build()
            .expect("default config is always valid");
        let deserialized: ConfigDeserialize =
            serde_ignored::deserialize(config, |_: serde_ignored::Path| {})
                .expect("default config is always valid");
        Self::from_deserialized("<default config>".into(), working_dir.as_ref(), deserialized)
            .expect("default backtrace exclusions are valid")
    }

    /// Returns the profile with the given name, or the default profile if `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<FormatterProfile<'_>, ProfileNotFound> {
        let name = name.unwrap_or(Self::DEFAULT_PROFILE);
        let custom_profile = match name {
            Self::DEFAULT_PROFILE => None,
            other => Some(self.other_profiles.get(other).ok_or_else(|| {
                ProfileNotFound::new(other, self.all_profiles())
            })?),
        };
        Ok(FormatterProfile {
            name: name.to_owned(),
            default_profile: &self.default_profile,
            custom_profile,
        })
    }

    /// Returns the names of all profiles, including the default profile.
    pub fn all_profiles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(Self::DEFAULT_PROFILE).chain(self.other_profiles.keys().map(|s| s.as_str()))
    }

    /// Returns the config file that was read, or would have been read if it existed.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(ConfigParseErrorKind::Build)?;

        let mut ignored = BTreeSet::new();
        let config: ConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                ignored.insert(path.to_string());
            })
            .map_err(ConfigParseErrorKind::Build)?;

        Ok((config, ignored))
    }

    fn from_deserialized(
        config_file: Utf8PathBuf,
        working_dir: &Utf8Path,
        mut deserialized: ConfigDeserialize,
    ) -> Result<Self, ConfigParseError> {
        let compile = |profile: &str, patterns: &[String]| {
            PatternBacktraceFilter::new(patterns)
                .map(|filter| Arc::new(filter.with_working_dir(working_dir)))
                .map_err(|error| {
                    ConfigParseError::new(
                        &config_file,
                        ConfigParseErrorKind::InvalidBacktraceExclusion {
                            profile: profile.to_owned(),
                            error,
                        },
                    )
                })
        };

        let default = deserialized
            .profiles
            .remove(Self::DEFAULT_PROFILE)
            .unwrap_or_default();
        let default_exclusions = default
            .backtrace_exclusions
            .expect("backtrace-exclusions present in default profile");
        let default_profile = DefaultProfileImpl {
            strict: default.strict.expect("strict present in default profile"),
            retry: default.retry.expect("retry present in default profile"),
            full_backtrace: default
                .full_backtrace
                .expect("full-backtrace present in default profile"),
            timestamps: default
                .timestamps
                .expect("timestamps present in default profile"),
            flow_id: default.flow_id,
            exclusion_filter: compile(Self::DEFAULT_PROFILE, &default_exclusions)?,
            backtrace_exclusions: default_exclusions,
        };

        let other_profiles = deserialized
            .profiles
            .into_iter()
            .map(|(name, profile)| {
                let exclusion_filter = match &profile.backtrace_exclusions {
                    Some(patterns) => Some(compile(&name, patterns)?),
                    None => None,
                };
                Ok::<_, ConfigParseError>((
                    name,
                    CustomProfileImpl {
                        inner: profile,
                        exclusion_filter,
                    },
                ))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            config_file,
            default_profile,
            other_profiles,
        })
    }
}

/// A named set of settings, with unset values inherited from the default profile.
#[derive(Clone, Debug)]
pub struct FormatterProfile<'cfg> {
    name: String,
    default_profile: &'cfg DefaultProfileImpl,
    custom_profile: Option<&'cfg CustomProfileImpl>,
}

impl<'cfg> FormatterProfile<'cfg> {
    /// Returns the name of the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if pending and undefined results are failures.
    pub fn strict(&self) -> bool {
        self.custom_profile
            .and_then(|profile| profile.inner.strict)
            .unwrap_or(self.default_profile.strict)
    }

    /// Returns the number of retries the test runner makes for a failing scenario.
    pub fn retry(&self) -> usize {
        self.custom_profile
            .and_then(|profile| profile.inner.retry)
            .unwrap_or(self.default_profile.retry)
    }

    /// Returns true if backtraces are reported without filtering.
    pub fn full_backtrace(&self) -> bool {
        self.custom_profile
            .and_then(|profile| profile.inner.full_backtrace)
            .unwrap_or(self.default_profile.full_backtrace)
    }

    /// Returns true if service messages carry timestamps.
    pub fn timestamps(&self) -> bool {
        self.custom_profile
            .and_then(|profile| profile.inner.timestamps)
            .unwrap_or(self.default_profile.timestamps)
    }

    /// Returns the flow ID for service messages, if any.
    pub fn flow_id(&self) -> Option<&'cfg str> {
        self.custom_profile
            .and_then(|profile| profile.inner.flow_id.as_deref())
            .or(self.default_profile.flow_id.as_deref())
    }

    /// Returns the backtrace exclusion patterns.
    pub fn backtrace_exclusions(&self) -> &'cfg [String] {
        self.custom_profile
            .and_then(|profile| profile.inner.backtrace_exclusions.as_deref())
            .unwrap_or(self.default_profile.backtrace_exclusions.as_slice())
    }

    /// Resolves every setting of this profile.
    pub fn settings(&self) -> FormatterSettings {
        let exclusion_filter = self
            .custom_profile
            .and_then(|profile| profile.exclusion_filter.clone())
            .unwrap_or_else(|| self.default_profile.exclusion_filter.clone());
        FormatterSettings {
            strict: self.strict(),
            retry_budget: self.retry(),
            full_backtrace: self.full_backtrace(),
            timestamps: self.timestamps(),
            flow_id: self.flow_id().map(ToOwned::to_owned),
            backtrace_exclusions: self.backtrace_exclusions().to_vec(),
            exclusion_filter,
        }
    }
}

/// Resolved formatter settings.
///
/// Obtained from [`FormatterProfile::settings`]. Fields may be overridden, e.g. from the command
/// line, before building a formatter.
#[derive(Clone, Debug)]
pub struct FormatterSettings {
    /// Treat pending and undefined results as failures.
    pub strict: bool,

    /// The number of retries the test runner makes for a failing scenario.
    pub retry_budget: usize,

    /// Report backtraces without filtering.
    pub full_backtrace: bool,

    /// Add timestamps to service messages.
    pub timestamps: bool,

    /// The flow ID for service messages.
    pub flow_id: Option<String>,

    /// The backtrace exclusion patterns.
    pub backtrace_exclusions: Vec<String>,

    exclusion_filter: Arc<PatternBacktraceFilter>,
}

impl FormatterSettings {
    /// Returns the backtrace filter these settings describe.
    pub fn backtrace_filter(&self) -> Arc<dyn BacktraceFilter + Send + Sync> {
        if self.full_backtrace {
            Arc::new(FullBacktrace)
        } else {
            self.exclusion_filter.clone()
        }
    }

    /// Returns a formatter builder with these settings.
    pub fn formatter_builder(&self) -> FormatterBuilder {
        let mut builder = FormatterBuilder::new(self.strict, self.retry_budget);
        builder.set_backtrace_filter(self.backtrace_filter());
        builder
    }
}

#[derive(Clone, Debug)]
struct DefaultProfileImpl {
    strict: bool,
    retry: usize,
    full_backtrace: bool,
    timestamps: bool,
    flow_id: Option<String>,
    backtrace_exclusions: Vec<String>,
    exclusion_filter: Arc<PatternBacktraceFilter>,
}

#[derive(Clone, Debug)]
struct CustomProfileImpl {
    inner: ProfileDeserialize,
    exclusion_filter: Option<Arc<PatternBacktraceFilter>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigDeserialize {
    #[serde(default, rename = "profile")]
    profiles: BTreeMap<String, ProfileDeserialize>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ProfileDeserialize {
    #[serde(default)]
    strict: Option<bool>,
    #[serde(default)]
    retry: Option<usize>,
    #[serde(default)]
    full_backtrace: Option<bool>,
    #[serde(default)]
    timestamps: Option<bool>,
    #[serde(default)]
    flow_id: Option<String>,
    #[serde(default)]
    backtrace_exclusions: Option<Vec<String>>,
}
