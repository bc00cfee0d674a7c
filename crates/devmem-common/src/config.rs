//! Benchmark constants loaded from TOML with environment variable overrides.
//!
//! [`BenchmarkConstants`] fixes the shape of a run: how many workers stream
//! over the buffer, how long each worker's slice is, and how many times a
//! kernel sweeps it per pass. The values are decided once at startup and
//! never tuned while a run is in progress.
//!
//! Precedence: defaults < TOML file (`devmem.toml`) < `DEVMEM_*` variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::units::ELEMENT_BYTES;

/// Hardware threads on the reference accelerator (60 cores, 4 threads each).
pub const DEFAULT_THREAD_COUNT: usize = 240;
/// Elements streamed by each worker per sweep.
pub const DEFAULT_ELEMENTS_PER_THREAD: usize = 480_000;
/// Sweeps over the slice per timed kernel.
pub const DEFAULT_REPETITIONS_PER_PASS: u32 = 100;
/// Seed added by worker 0 on the first write sweep.
pub const DEFAULT_WRITE_BASE_VALUE: f32 = 1.0;

/// Upper bound on worker threads accepted by [`BenchmarkConstants::validate`].
pub const MAX_THREAD_COUNT: usize = 4096;

const ENV_THREAD_COUNT: &str = "DEVMEM_THREAD_COUNT";
const ENV_ELEMENTS_PER_THREAD: &str = "DEVMEM_ELEMENTS_PER_THREAD";
const ENV_REPETITIONS: &str = "DEVMEM_REPETITIONS";
const ENV_WRITE_BASE_VALUE: &str = "DEVMEM_WRITE_BASE_VALUE";
const ENV_MEMORY_LIMIT: &str = "DEVMEM_MEMORY_LIMIT";

/// Fixed shape of a bandwidth run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConstants {
    /// Number of parallel workers per kernel invocation.
    /// Override: `DEVMEM_THREAD_COUNT`
    pub thread_count: usize,

    /// Length of each worker's contiguous slice.
    /// Override: `DEVMEM_ELEMENTS_PER_THREAD`
    pub elements_per_thread: usize,

    /// Sweeps over the slice inside one timed kernel.
    /// Override: `DEVMEM_REPETITIONS`
    pub repetitions_per_pass: u32,

    /// Base value of the write kernel's per-worker seed.
    /// Override: `DEVMEM_WRITE_BASE_VALUE`
    pub write_base_value: f32,

    /// Device memory available for staged buffers, in bytes (0 = unlimited).
    /// Override: `DEVMEM_MEMORY_LIMIT`
    pub memory_limit_bytes: u64,
}

impl Default for BenchmarkConstants {
    fn default() -> Self {
        Self {
            thread_count: DEFAULT_THREAD_COUNT,
            elements_per_thread: DEFAULT_ELEMENTS_PER_THREAD,
            repetitions_per_pass: DEFAULT_REPETITIONS_PER_PASS,
            write_base_value: DEFAULT_WRITE_BASE_VALUE,
            memory_limit_bytes: 0,
        }
    }
}

/// Errors that can occur when loading or validating [`BenchmarkConstants`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride {
        key: String,
        value: String,
        reason: String,
    },
}

impl BenchmarkConstants {
    /// Render the default configuration as a TOML document.
    pub fn default_toml() -> Result<String, ConfigError> {
        Self::default().to_toml()
    }

    /// Render these constants as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load constants from a TOML file, then apply environment overrides
    /// and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse constants from a TOML string, then apply environment overrides
    /// and validate. Missing keys keep their defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: BenchmarkConstants = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults, then the TOML file at `path` if given, then environment
    /// overrides. Not validated: callers layer their own overrides on top and
    /// call [`validate`](Self::validate) once at the end.
    pub fn from_sources(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Start from defaults and apply only environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every invariant the kernels rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(ConfigError::Validation("thread_count must be > 0".into()));
        }
        if self.thread_count > MAX_THREAD_COUNT {
            return Err(ConfigError::Validation(format!(
                "thread_count must be <= {MAX_THREAD_COUNT}, got {}",
                self.thread_count
            )));
        }
        if self.elements_per_thread == 0 {
            return Err(ConfigError::Validation("elements_per_thread must be > 0".into()));
        }
        if self.repetitions_per_pass == 0 {
            return Err(ConfigError::Validation("repetitions_per_pass must be > 0".into()));
        }
        if !self.write_base_value.is_finite() {
            return Err(ConfigError::Validation(format!(
                "write_base_value must be finite, got {}",
                self.write_base_value
            )));
        }
        let total = self.checked_total_elements().ok_or_else(|| {
            ConfigError::Validation(format!(
                "elements_per_thread * thread_count overflows ({} * {})",
                self.elements_per_thread, self.thread_count
            ))
        })?;
        let bytes = total.checked_mul(ELEMENT_BYTES).ok_or_else(|| {
            ConfigError::Validation(format!("buffer of {total} elements overflows usize bytes"))
        })?;
        if self.memory_limit_bytes != 0 && bytes as u64 > self.memory_limit_bytes {
            return Err(ConfigError::Validation(format!(
                "buffer needs {bytes} bytes but memory_limit_bytes is {}",
                self.memory_limit_bytes
            )));
        }
        Ok(())
    }

    /// `elements_per_thread * thread_count`, or `None` on overflow.
    pub fn checked_total_elements(&self) -> Option<usize> {
        self.elements_per_thread.checked_mul(self.thread_count)
    }

    /// Length of the work buffer. Saturates on overflow; validated constants
    /// never overflow.
    pub fn total_elements(&self) -> usize {
        self.elements_per_thread.saturating_mul(self.thread_count)
    }

    /// Size of the work buffer in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.total_elements().saturating_mul(ELEMENT_BYTES)
    }

    /// Bytes one timed kernel moves: per-thread slice bytes times the
    /// repetition count times the number of threads. Computed in `f64`,
    /// matching how the figure feeds the bandwidth calculation.
    #[allow(clippy::cast_precision_loss)]
    pub fn bytes_moved_per_kernel(&self) -> f64 {
        self.elements_per_thread as f64
            * f64::from(self.repetitions_per_pass)
            * ELEMENT_BYTES as f64
            * self.thread_count as f64
    }

    /// Apply `DEVMEM_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<usize>(ENV_THREAD_COUNT)? {
            self.thread_count = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_ELEMENTS_PER_THREAD)? {
            self.elements_per_thread = v;
        }
        if let Some(v) = env_parse::<u32>(ENV_REPETITIONS)? {
            self.repetitions_per_pass = v;
        }
        if let Some(v) = env_parse::<f32>(ENV_WRITE_BASE_VALUE)? {
            self.write_base_value = v;
        }
        if let Some(v) = env_parse::<u64>(ENV_MEMORY_LIMIT)? {
            self.memory_limit_bytes = v;
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<T>().map(Some).map_err(|e| ConfigError::EnvOverride {
            key: key.into(),
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}
