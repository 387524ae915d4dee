//! Benchmark Session
//!
//! Owns the case registry and configuration, runs the selected cases one
//! after another and hands every outcome to the registered reporters.

use crate::config::SimpleBenchConfig;
use crate::reporter::Reporter;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use simplebench_core::{BenchmarkSpec, Case, CaseFailure, CaseRegistry, FailureKind, ResultSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber used by sessions.
///
/// `RUST_LOG` wins when set. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "simplebench=debug,simplebench_core=debug"
    } else {
        "simplebench=info,simplebench_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Outcome of [`Session::run`]
#[derive(Debug, Default)]
pub struct SessionSummary {
    results: Vec<ResultSet>,
    failures: Vec<CaseFailure>,
}

impl SessionSummary {
    /// Cases that measured every variation, in run order
    pub fn results(&self) -> &[ResultSet] {
        &self.results
    }

    /// Cases that aborted, in run order
    pub fn failures(&self) -> &[CaseFailure] {
        &self.failures
    }

    /// Whether every selected case succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed cases of the given kind
    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures
            .iter()
            .filter(|f| f.error.kind() == kind)
            .count()
    }
}

/// Driver for a set of cases
pub struct Session {
    registry: CaseRegistry,
    config: SimpleBenchConfig,
    reporters: Vec<Box<dyn Reporter>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_config(SimpleBenchConfig::default())
    }
}

impl Session {
    /// Session with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Session configured from a discovered `simplebench.toml`, if any
    pub fn discover() -> Self {
        Self::with_config(SimpleBenchConfig::discover().unwrap_or_default())
    }

    /// Session with an explicit configuration
    pub fn with_config(config: SimpleBenchConfig) -> Self {
        Self {
            registry: CaseRegistry::new(),
            config,
            reporters: Vec::new(),
        }
    }

    /// Configuration in force
    pub fn config(&self) -> &SimpleBenchConfig {
        &self.config
    }

    /// Mutable configuration, e.g. to apply command-line overrides
    pub fn config_mut(&mut self) -> &mut SimpleBenchConfig {
        &mut self.config
    }

    /// Registered cases
    pub fn registry(&self) -> &CaseRegistry {
        &self.registry
    }

    /// Register a case
    pub fn register(&mut self, case: Case) -> anyhow::Result<()> {
        self.registry
            .register(case)
            .context("registering benchmark case")
    }

    /// Drop every registered case
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Add a reporter; reporters are called in the order they were added
    pub fn add_reporter(&mut self, reporter: impl Reporter + 'static) {
        self.reporters.push(Box::new(reporter));
    }

    /// Run every selected case.
    ///
    /// A failing case does not stop the session; it is logged, passed to
    /// [`Reporter::report_failure`] and listed in the summary. Reporter
    /// errors and invalid configuration do stop it.
    pub fn run(&mut self) -> anyhow::Result<SessionSummary> {
        init_logging(self.config.session.verbose);

        let defaults = Arc::new(self.config.runner.to_spec()?);
        let filter = self
            .config
            .session
            .filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("invalid case filter")?;
        let cases = self
            .registry
            .select(filter.as_ref(), self.config.session.group.as_deref());

        if cases.is_empty() {
            warn!("no benchmark cases selected");
            return Ok(SessionSummary::default());
        }
        info!(cases = cases.len(), "starting session");

        let pb = if self.config.session.show_progress {
            let pb = ProgressBar::new(cases.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut summary = SessionSummary::default();
        for case in cases {
            pb.set_message(case.id());
            let outcome = run_case(case, &defaults);
            pb.inc(1);

            match outcome {
                Ok(results) => {
                    for reporter in &mut self.reporters {
                        reporter
                            .report(&results)
                            .with_context(|| format!("reporter `{}` failed", reporter.name()))?;
                    }
                    summary.results.push(results);
                }
                Err(failure) => {
                    for reporter in &mut self.reporters {
                        reporter.report_failure(&failure).with_context(|| {
                            format!("reporter `{}` failed", reporter.name())
                        })?;
                    }
                    summary.failures.push(failure);
                }
            }
        }
        pb.finish_and_clear();

        info!(
            passed = summary.results.len(),
            failed = summary.failures.len(),
            "session complete"
        );
        Ok(summary)
    }
}

fn run_case(case: &Case, defaults: &Arc<BenchmarkSpec>) -> Result<ResultSet, CaseFailure> {
    match case.run_with_defaults(defaults) {
        Ok(results) => {
            info!(case = %case.id(), variations = results.len(), "case complete");
            Ok(results)
        }
        Err(failure) => {
            error!(
                case = %case.id(),
                kind = ?failure.error.kind(),
                variation = %failure.variation,
                error = %failure.error,
                "case failed"
            );
            Err(failure)
        }
    }
}
