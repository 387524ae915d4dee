//! Benchmark Cases
//!
//! A [`Case`] ties an action to its variation declaration and, optionally,
//! its own [`BenchmarkSpec`] and setup/teardown hooks. Declarations are
//! validated when the case is built; running a case schedules each variation
//! in expansion order and stops at the first failure.

use crate::error::{ActionError, ConfigError, RunError, panic_message};
use crate::results::{CaseFailure, ResultSet, VariationResult};
use crate::scheduler::{Action, ActionContext, BenchmarkScheduler, RawRun, RoundHooks};
use crate::spec::BenchmarkSpec;
use crate::variation::{ParamValue, Variation, VariationExpander};
use rayon::prelude::*;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// A named benchmark with its variations
pub struct Case {
    group: String,
    title: String,
    description: Option<String>,
    spec: Option<Arc<BenchmarkSpec>>,
    expander: VariationExpander,
    variations: Vec<Variation>,
    n_key: Option<String>,
    action: Arc<dyn Action>,
    hooks: RoundHooks,
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("group", &self.group)
            .field("title", &self.title)
            .field("variations", &self.variations.len())
            .field("n_key", &self.n_key)
            .field("spec", &self.spec)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Case {
    /// Start declaring a case
    pub fn builder(group: impl Into<String>, title: impl Into<String>) -> CaseBuilder {
        CaseBuilder {
            group: group.into(),
            title: title.into(),
            description: None,
            spec: None,
            expander: VariationExpander::new(),
            n_key: None,
            action: None,
            hooks: RoundHooks::default(),
        }
    }

    /// Group name
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `group/title`, used for filtering
    pub fn id(&self) -> String {
        format!("{}/{}", self.group, self.title)
    }

    /// Free-form description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The case's own spec, if it overrides the session defaults
    pub fn spec(&self) -> Option<&Arc<BenchmarkSpec>> {
        self.spec.as_ref()
    }

    /// Expanded variations, in run order
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// The variation declaration
    pub fn expander(&self) -> &VariationExpander {
        &self.expander
    }

    /// Operations per invocation for `variation`
    pub fn n_for(&self, variation: &Variation, spec: &BenchmarkSpec) -> u64 {
        self.n_key
            .as_deref()
            .and_then(|key| variation.param(key))
            .and_then(ParamValue::as_u64)
            .unwrap_or(spec.n())
    }

    /// Run under the case's own spec, or the defaults if it has none
    pub fn run(&self) -> Result<ResultSet, CaseFailure> {
        let defaults = Arc::new(BenchmarkSpec::default());
        self.run_with_defaults(&defaults)
    }

    /// Run under the case's own spec, or `defaults` if it has none
    pub fn run_with_defaults(
        &self,
        defaults: &Arc<BenchmarkSpec>,
    ) -> Result<ResultSet, CaseFailure> {
        let spec = Arc::clone(self.spec.as_ref().unwrap_or(defaults));
        let keep_samples = spec.keep_samples();
        let scheduler = BenchmarkScheduler::new(Arc::clone(&spec));

        info!(case = %self.id(), variations = self.variations.len(), "running case");

        let mut raw_runs: Vec<(Variation, u64, RawRun)> = Vec::with_capacity(self.variations.len());
        for variation in &self.variations {
            let n = self.n_for(variation, &spec);
            match self.run_variation(&scheduler, variation, n) {
                Ok(raw) => raw_runs.push((variation.clone(), n, raw)),
                Err(error) => {
                    warn!(case = %self.id(), variation = %variation, %error, "variation failed");
                    return Err(CaseFailure {
                        group: self.group.clone(),
                        title: self.title.clone(),
                        variation: variation.clone(),
                        error,
                        completed: self.summarize_completed(raw_runs, keep_samples),
                    });
                }
            }
        }

        match summarize(raw_runs, keep_samples) {
            Ok(results) => Ok(ResultSet::new(
                self.group.clone(),
                self.title.clone(),
                self.description.clone(),
                self.expander.columns().to_vec(),
                results,
            )),
            Err((variation, error)) => Err(CaseFailure {
                group: self.group.clone(),
                title: self.title.clone(),
                variation,
                error,
                completed: Vec::new(),
            }),
        }
    }

    fn run_variation(
        &self,
        scheduler: &BenchmarkScheduler,
        variation: &Variation,
        n: u64,
    ) -> Result<RawRun, RunError> {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            scheduler.run_with_hooks(&self.action, &self.hooks, variation, n)
        })) {
            Ok(result) => result,
            Err(payload) => Err(RunError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Summaries of the variations that finished before a failure. Runs that
    /// cannot be summarized are logged and left out.
    fn summarize_completed(
        &self,
        raw_runs: Vec<(Variation, u64, RawRun)>,
        keep_samples: bool,
    ) -> Vec<VariationResult> {
        summarize_each(raw_runs, keep_samples)
            .into_iter()
            .filter_map(|summary| match summary {
                Ok(result) => Some(result),
                Err((variation, error)) => {
                    warn!(
                        case = %self.id(),
                        variation = %variation,
                        %error,
                        "dropping completed variation that could not be summarized"
                    );
                    None
                }
            })
            .collect()
    }
}

type Summary = Result<VariationResult, (Variation, RunError)>;

/// Summarize raw runs in parallel, preserving order
fn summarize_each(raw_runs: Vec<(Variation, u64, RawRun)>, keep_samples: bool) -> Vec<Summary> {
    raw_runs
        .into_par_iter()
        .map(|(variation, n, raw)| {
            VariationResult::from_raw(variation.clone(), n, raw, keep_samples)
                .map_err(|e| (variation, e))
        })
        .collect()
}

/// All summaries, or the first run that could not be summarized
fn summarize(
    raw_runs: Vec<(Variation, u64, RawRun)>,
    keep_samples: bool,
) -> Result<Vec<VariationResult>, (Variation, RunError)> {
    summarize_each(raw_runs, keep_samples).into_iter().collect()
}

/// Builder for [`Case`]
pub struct CaseBuilder {
    group: String,
    title: String,
    description: Option<String>,
    spec: Option<Arc<BenchmarkSpec>>,
    expander: VariationExpander,
    n_key: Option<String>,
    action: Option<Arc<dyn Action>>,
    hooks: RoundHooks,
}

impl CaseBuilder {
    /// Free-form description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Use `spec` instead of the session defaults
    pub fn spec(mut self, spec: BenchmarkSpec) -> Self {
        self.spec = Some(Arc::new(spec));
        self
    }

    /// Declare candidate values for `key`
    pub fn vary<K, I, V>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.expander = self.expander.vary(key, values);
        self
    }

    /// Show `key` as a report column titled `label`
    pub fn column(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.expander = self.expander.column(key, label);
        self
    }

    /// Replace the whole variation declaration
    pub fn variations(mut self, expander: VariationExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Take `n` from the value bound to `key` in each variation
    pub fn n_from(mut self, key: impl Into<String>) -> Self {
        self.n_key = Some(key.into());
        self
    }

    /// The code to measure
    pub fn action<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(f));
        self
    }

    /// An already shared action
    pub fn shared_action(mut self, action: Arc<dyn Action>) -> Self {
        self.action = Some(action);
        self
    }

    /// Run before each warmup invocation and measured round, untimed
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.setup(Arc::new(f));
        self
    }

    /// Run after each warmup invocation and measured round, untimed
    pub fn teardown<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.teardown(Arc::new(f));
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Case, ConfigError> {
        if self.group.trim().is_empty() {
            return Err(ConfigError::Blank("case group"));
        }
        if self.title.trim().is_empty() {
            return Err(ConfigError::Blank("case title"));
        }
        let action = self
            .action
            .ok_or_else(|| ConfigError::MissingAction(format!("{}/{}", self.group, self.title)))?;
        let variations = self.expander.expand()?;

        if let Some(key) = &self.n_key {
            let candidates = self
                .expander
                .candidates(key)
                .ok_or_else(|| ConfigError::UnknownNKey(key.clone()))?;
            if let Some(bad) = candidates.iter().find(|v| !matches!(v.as_u64(), Some(n) if n >= 1)) {
                return Err(ConfigError::InvalidNValue {
                    key: key.clone(),
                    value: bad.to_string(),
                });
            }
        }

        Ok(Case {
            group: self.group,
            title: self.title,
            description: self.description,
            spec: self.spec,
            expander: self.expander,
            variations,
            n_key: self.n_key,
            action,
            hooks: self.hooks,
        })
    }
}
