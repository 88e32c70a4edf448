//! Invocation driver.
//!
//! A [`Session`] owns everything one run needs: the resolved configuration,
//! the problem report and the suggestion counter. It is built once, runs
//! configuration → classification → resolution → dispatch → rendering in
//! that order, and yields an [`Outcome`] with the exit status.
//!
//! Exit codes: `0` success (findings may have been printed), `1` fatal
//! (configuration failure, output failure, or suggestions found while
//! `set_exit_status` is on), `2` usage error.

use crate::config::{self, Config, ConfigError, OnMissing, PathFilter, Resolved};
use crate::discovery::Discovery;
use crate::engine::Engine;
use crate::lint::{Dispatcher, SuggestionCounter, DEFAULT_MIN_CONFIDENCE};
use crate::models::ProblemReport;
use crate::output::OutputFormat;
use crate::target::{Plan, Resolver, UsageError};
use crate::utils::Diagnostics;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Clone)]
/// Run settings after CLI parsing.
pub struct RunOptions {
    pub min_confidence: f64,
    pub set_exit_status: bool,
    pub format: OutputFormat,
    pub config_path: Option<PathBuf>,
    pub on_missing: OnMissing,
    pub parallel: bool,
    pub targets: Vec<String>,
    pub color: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            set_exit_status: false,
            format: OutputFormat::Text,
            config_path: None,
            on_missing: OnMissing::Default,
            parallel: false,
            targets: Vec::new(),
            color: false,
        }
    }
}

#[derive(Debug, Error)]
/// Conditions that stop a run before rendering.
pub enum RunError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error("unable to read configuration file: {0}")]
    Config(#[from] ConfigError),
    #[error("write output: {0}")]
    Output(#[from] io::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Usage(_) => EXIT_USAGE,
            RunError::Config(_) | RunError::Output(_) => EXIT_FAILURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub report: ProblemReport,
    pub suggestions: usize,
    pub exit_code: i32,
}

pub struct Session {
    config: Config,
    filter: PathFilter,
    options: RunOptions,
    report: ProblemReport,
    counter: SuggestionCounter,
}

impl Session {
    /// Resolve the configuration for this run. Fails before any target is
    /// looked at.
    pub fn start(options: RunOptions) -> Result<Self, RunError> {
        let resolved = config::resolve(options.config_path.as_deref(), options.on_missing)?;
        Ok(Self::from_resolved(resolved, options))
    }

    /// Session over an in-memory configuration. Fails when its patterns do
    /// not compile.
    pub fn with_config(config: Config, options: RunOptions) -> Result<Self, RunError> {
        Ok(Self::from_resolved(Resolved::new(config)?, options))
    }

    fn from_resolved(resolved: Resolved, options: RunOptions) -> Self {
        let counter = SuggestionCounter::new(options.min_confidence);
        Self {
            config: resolved.config,
            filter: resolved.filter,
            options,
            report: ProblemReport::new(),
            counter,
        }
    }

    /// Classify, resolve, analyze and render. Findings go to `out`,
    /// diagnostics to `err`.
    pub fn run(
        mut self,
        discovery: &dyn Discovery,
        engine: &dyn Engine,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Outcome, RunError> {
        let plan = Plan::from_args(&self.options.targets)?;
        let mut diag = Diagnostics::new(err, self.options.color);

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let units = Resolver::new(discovery)
            .with_filter(&self.filter, cwd)
            .resolve(&plan, &mut diag);
        info!("Resolved {} compilation units", units.len());

        Dispatcher::new(engine, &self.config)
            .parallel(self.options.parallel)
            .run(&units, &mut self.report, &mut self.counter, &mut diag);

        self.options.format.render(self.report.problems(), out)?;
        out.flush()?;

        let suggestions = self.counter.count();
        debug!(
            "{} problems rendered, {} suggestions",
            self.report.len(),
            suggestions
        );
        let exit_code = if self.options.set_exit_status && suggestions > 0 {
            diag.error(format!("Found {} lint suggestions; failing.", suggestions));
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        };
        Ok(Outcome {
            report: self.report,
            suggestions,
            exit_code,
        })
    }
}

/// Start a session and run it. Fatal errors come back as `Err` for the
/// caller to report with [`RunError::exit_code`].
pub fn run(
    options: RunOptions,
    discovery: &dyn Discovery,
    engine: &dyn Engine,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Outcome, RunError> {
    Session::start(options)?.run(discovery, engine, out, err)
}
