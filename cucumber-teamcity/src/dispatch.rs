// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    exit_codes::CucumberTeamcityExitCode,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
};
use teamcity_formatter::{
    config::{FormatterConfig, FormatterSettings},
    emitter::TeamcityEmitter,
    lookup::FeatureIndex,
    stream::run_stream,
};
use tracing::debug;

/// Report behavior-driven test runs to TeamCity.
///
/// Reads test runner events, one JSON object per line, and writes TeamCity service messages to
/// standard output.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct CucumberTeamcityApp {
    /// Event stream to read [default: standard input]
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(flatten)]
    formatter_opts: FormatterOpts,

    #[command(flatten)]
    output: OutputOpts,
}

impl CucumberTeamcityApp {
    /// Initializes logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self) -> Result<i32> {
        let working_dir = current_dir()?;
        let settings = self.settings(&working_dir)?;

        let stdout = BufWriter::new(io::stdout().lock());
        match &self.input {
            Some(path) => {
                let file = File::open(path).map_err(|err| ExpectedError::InputOpenFailed {
                    path: path.clone(),
                    err,
                })?;
                run_report(BufReader::new(file), stdout, &settings)
            }
            None => run_report(io::stdin().lock(), stdout, &settings),
        }
    }

    fn settings(&self, working_dir: &Utf8Path) -> Result<FormatterSettings> {
        let config = self.config_opts.make_config(working_dir)?;
        let profile = config.profile(self.config_opts.profile.as_deref())?;
        debug!(profile = profile.name(), "using profile");

        let mut settings = profile.settings();
        self.formatter_opts.apply(&mut settings);
        Ok(settings)
    }
}

#[derive(Debug, Args)]
#[command(next_help_heading = "CONFIG OPTIONS")]
struct ConfigOpts {
    /// Config file [default: .config/cucumber-teamcity.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Config profile to use [default: default]
    #[arg(long, short = 'P', value_name = "NAME", env = "CUCUMBER_TEAMCITY_PROFILE")]
    profile: Option<String>,
}

impl ConfigOpts {
    fn make_config(&self, working_dir: &Utf8Path) -> Result<FormatterConfig> {
        Ok(FormatterConfig::from_sources(
            working_dir,
            self.config_file.as_deref(),
        )?)
    }
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "FORMATTER OPTIONS")]
struct FormatterOpts {
    /// Treat pending and undefined results as failures
    #[arg(long, overrides_with = "no_strict")]
    strict: bool,

    /// Treat pending and undefined results as passing
    #[arg(long, overrides_with = "strict")]
    no_strict: bool,

    /// Number of times the test runner retries a failing scenario
    #[arg(long, value_name = "N")]
    retry: Option<usize>,

    /// Report backtraces without filtering out test framework frames
    #[arg(long)]
    full_backtrace: bool,
}

impl FormatterOpts {
    fn strict(&self) -> Option<bool> {
        match (self.strict, self.no_strict) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            (false, false) => None,
        }
    }

    fn apply(&self, settings: &mut FormatterSettings) {
        if let Some(strict) = self.strict() {
            settings.strict = strict;
        }
        if let Some(retry) = self.retry {
            settings.retry_budget = retry;
        }
        if self.full_backtrace {
            settings.full_backtrace = true;
        }
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|err| ExpectedError::CurrentDirFailed { err })?;
    Utf8PathBuf::try_from(dir).map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
}

/// Reads events from `input` and writes the TeamCity report to `output`.
fn run_report(
    input: impl BufRead,
    output: impl Write,
    settings: &FormatterSettings,
) -> Result<i32> {
    let mut emitter = TeamcityEmitter::new(output);
    emitter.set_timestamps(settings.timestamps);
    if let Some(flow_id) = &settings.flow_id {
        emitter.set_flow_id(flow_id.clone());
    }

    let mut formatter = settings
        .formatter_builder()
        .build(emitter, FeatureIndex::new());
    let result = run_stream(input, &mut formatter);

    // Flush whatever was written, even if the stream was cut short.
    let flushed = formatter.emitter_mut().flush();
    result.map_err(ExpectedError::from_run_stream)?;
    flushed.map_err(|err| ExpectedError::WriteError { err })?;

    if formatter.has_failures() {
        Ok(CucumberTeamcityExitCode::SCENARIOS_FAILED)
    } else {
        Ok(CucumberTeamcityExitCode::OK)
    }
}
