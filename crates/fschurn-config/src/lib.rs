//! # fschurn-config
//!
//! Configuration management for the fschurn tools.
//!
//! Loads configuration from:
//! 1. `~/.fschurn/config.toml` (global)
//! 2. `.fschurn.toml` in the working directory (replaces global)
//! 3. Environment variables (highest priority)
//!
//! An explicit `--config` path replaces steps 1 and 2.

pub mod duration;
pub mod logging;

pub use duration::{parse_duration, DurationError};
pub use fschurn_store::{DigestAlgorithm, StoreOptions};
pub use logging::{init_logging, Component, LogLevel};

#[doc(hidden)]
pub use tracing;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreOptions,
    pub pipeline: PipelineConfig,
    pub generator: GeneratorConfig,
}

impl Config {
    /// Load config from standard locations, or from `explicit` when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                Self::from_file(path)?
            }
            None => Self::load_layered()?,
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn load_layered() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                config = Self::from_file(&global_path)?;
            }
        }

        let project_path = Path::new(".fschurn.toml");
        if project_path.exists() {
            debug!("Loading project config from {:?}", project_path);
            config = Self::from_file(project_path)?;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Global config path: ~/.fschurn/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fschurn/config.toml"))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(workers) = std::env::var("FSCHURN_WORKERS") {
            self.pipeline.workers = workers
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("FSCHURN_WORKERS={}", workers)))?;
        }
        if let Ok(seed) = std::env::var("FSCHURN_SEED") {
            let seed = seed
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("FSCHURN_SEED={}", seed)))?;
            self.pipeline.seed = Some(seed);
        }
        if let Ok(algo) = std::env::var("FSCHURN_DIGEST") {
            self.store.algorithm = algo.parse().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.generator.sizes.validate()
    }

    /// Render as TOML, in the same shape `from_file` reads.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Generate default config TOML string
    pub fn default_toml() -> String {
        Config::default().to_toml()
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent workers (default: 1)
    pub workers: usize,
    /// Capacity of the traversal → sampler queue (default: 2)
    pub traversal_capacity: usize,
    /// Worker queue holds this many paths per worker (default: 2)
    pub queue_per_worker: usize,
    /// Top-level seed; drawn from the OS when unset
    pub seed: Option<u64>,
    /// Log a progress line every this many admitted paths (0 disables)
    pub report_every: u64,
    pub sample: SamplePolicy,
    pub weights: OperationWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            traversal_capacity: 2,
            queue_per_worker: 2,
            seed: None,
            report_every: 1000,
            sample: SamplePolicy::default(),
            weights: OperationWeights::default(),
        }
    }
}

impl PipelineConfig {
    pub fn worker_capacity(&self) -> usize {
        self.queue_per_worker.saturating_mul(self.workers)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.traversal_capacity == 0 || self.queue_per_worker == 0 {
            return Err(ConfigError::Invalid("queue capacities must be at least 1".into()));
        }
        self.sample.validate()?;
        self.weights.validate()
    }
}

/// Which discovered paths get exercised, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplePolicy {
    /// Probability that a discovered path is admitted (default: 0.25)
    pub admit_probability: f64,
    /// Admitted paths are emitted uniformly 1..=max_replicas times (default: 3)
    pub max_replicas: u32,
}

impl Default for SamplePolicy {
    fn default() -> Self {
        Self {
            admit_probability: 0.25,
            max_replicas: 3,
        }
    }
}

impl SamplePolicy {
    /// Admit every path exactly once.
    pub fn pass_through() -> Self {
        Self {
            admit_probability: 1.0,
            max_replicas: 1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.admit_probability > 0.0 && self.admit_probability <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "admit_probability must be in (0, 1], got {}",
                self.admit_probability
            )));
        }
        if self.max_replicas == 0 {
            return Err(ConfigError::Invalid("max_replicas must be at least 1".into()));
        }
        Ok(())
    }
}

/// Relative weights of the per-path operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationWeights {
    pub verify_read: u32,
    pub range_read: u32,
    pub range_read_write: u32,
    pub write_new: u32,
}

impl Default for OperationWeights {
    fn default() -> Self {
        Self {
            verify_read: 1,
            range_read: 1,
            range_read_write: 1,
            write_new: 1,
        }
    }
}

impl OperationWeights {
    pub fn only_verify() -> Self {
        Self {
            verify_read: 1,
            range_read: 0,
            range_read_write: 0,
            write_new: 0,
        }
    }

    pub fn only_range_read() -> Self {
        Self {
            verify_read: 0,
            range_read: 1,
            range_read_write: 0,
            write_new: 0,
        }
    }

    /// Equal mix of the three non-creating operations.
    pub fn read_write() -> Self {
        Self {
            write_new: 0,
            ..Self::default()
        }
    }

    pub fn as_array(&self) -> [u32; 4] {
        [
            self.verify_read,
            self.range_read,
            self.range_read_write,
            self.write_new,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.as_array().iter().all(|w| *w == 0) {
            return Err(ConfigError::Invalid("at least one operation weight must be non-zero".into()));
        }
        Ok(())
    }
}

/// Fill generator configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sizes: SizeRange,
}

/// Inclusive bounds for generated file sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min: 1_000_000,
            max: 29_999_999,
        }
    }
}

impl SizeRange {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 {
            return Err(ConfigError::Invalid("min file size must be at least 1 byte".into()));
        }
        if self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "min file size {} exceeds max file size {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}
