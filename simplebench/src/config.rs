//! Configuration loading from simplebench.toml
//!
//! SimpleBench configuration can be specified in a `simplebench.toml` file in
//! the project root. The configuration is automatically discovered by walking
//! up from the current directory.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use simplebench_core::{
    BenchmarkSpec, DEFAULT_ITERATIONS, DEFAULT_ROUNDS, DEFAULT_WARMUP_ITERATIONS,
};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// File name looked up by [`SimpleBenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "simplebench.toml";

/// SimpleBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimpleBenchConfig {
    /// Default scheduling parameters
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,
}

/// Default scheduling parameters for cases without their own spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Minimum number of measured rounds
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Unmeasured invocations before measurement
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: u64,
    /// Invocations per timed round
    #[serde(default = "default_rounds")]
    pub rounds: u64,
    /// Minimum measurement time (e.g., "5s")
    #[serde(default = "default_min_time")]
    pub min_time: String,
    /// Maximum measurement time (e.g., "20s")
    #[serde(default = "default_max_time")]
    pub max_time: Option<String>,
    /// Deadline for the measurement phase (e.g., "60s")
    #[serde(default)]
    pub timeout: Option<String>,
    /// Collect memory sections
    #[serde(default)]
    pub track_memory: bool,
    /// Keep raw samples on results
    #[serde(default)]
    pub keep_samples: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            warmup_iterations: default_warmup_iterations(),
            rounds: default_rounds(),
            min_time: default_min_time(),
            max_time: default_max_time(),
            timeout: None,
            track_memory: false,
            keep_samples: false,
        }
    }
}

fn default_iterations() -> u64 {
    DEFAULT_ITERATIONS
}
fn default_warmup_iterations() -> u64 {
    DEFAULT_WARMUP_ITERATIONS
}
fn default_rounds() -> u64 {
    DEFAULT_ROUNDS
}
fn default_min_time() -> String {
    "5s".to_string()
}
fn default_max_time() -> Option<String> {
    Some("20s".to_string())
}

/// Session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Show a progress bar while cases run
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    /// Debug-level logging
    #[serde(default)]
    pub verbose: bool,
    /// Regex on `group/title`; only matching cases run
    #[serde(default)]
    pub filter: Option<String>,
    /// Only run cases of this group
    #[serde(default)]
    pub group: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
            verbose: false,
            filter: None,
            group: None,
        }
    }
}

fn default_show_progress() -> bool {
    true
}

impl RunnerConfig {
    /// Resolve into a validated spec
    pub fn to_spec(&self) -> anyhow::Result<BenchmarkSpec> {
        let mut builder = BenchmarkSpec::builder()
            .iterations(self.iterations)
            .warmup_iterations(self.warmup_iterations)
            .rounds(self.rounds)
            .min_time(SimpleBenchConfig::parse_duration(&self.min_time)?)
            .track_memory(self.track_memory)
            .keep_samples(self.keep_samples);

        builder = match &self.max_time {
            Some(max) => builder.max_time(SimpleBenchConfig::parse_duration(max)?),
            None => builder.unbounded(),
        };
        if let Some(timeout) = &self.timeout {
            builder = builder.timeout(SimpleBenchConfig::parse_duration(timeout)?);
        }

        builder.build().context("invalid [runner] configuration")
    }
}

impl SimpleBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for [`CONFIG_FILE_NAME`].
    ///
    /// The nearest file wins; if it fails to parse, a warning is logged and
    /// `None` is returned.
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!("ignoring {}: {e:#}", config_path.display());
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# SimpleBench Configuration

[runner]
# Minimum number of measured rounds
iterations = 20
# Unmeasured invocations before measurement
warmup_iterations = 10
# Invocations per timed round
rounds = 1
# Keep measuring until this much time has passed
min_time = "5s"
# Stop measuring after this much time, even below `iterations`
max_time = "20s"
# Abort a variation whose measurement exceeds this (uncomment to enable)
# timeout = "60s"
# Record memory sections (requires TrackingAllocator as global allocator)
track_memory = false
# Keep raw samples on results
keep_samples = false

[session]
# Show a progress bar while cases run
show_progress = true
# Debug-level logging
verbose = false
# Only run cases whose group/title matches this regex (uncomment to enable)
# filter = "sort"
# Only run cases of this group (uncomment to enable)
# group = "sorting"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m"); bare numbers are seconds
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        let nanos = value * multiplier as f64;
        if !nanos.is_finite() || nanos < 0.0 || nanos > u64::MAX as f64 {
            return Err(anyhow::anyhow!("Duration out of range: {}", s));
        }
        Ok(Duration::from_nanos(nanos.round() as u64))
    }
}
