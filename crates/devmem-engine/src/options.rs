//! Named run options and the [`RunConfig`] the pass driver derives from them.
//!
//! The engine only ever asks an [`OptionSource`] for `"passes"` and
//! `"verbose"`; how those values got there (command line, defaults, test
//! fixtures) is the caller's business.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Option holding the number of measurement passes.
pub const OPT_PASSES: &str = "passes";
/// Option enabling test-parameter and timing output.
pub const OPT_VERBOSE: &str = "verbose";
/// Option suppressing progress output.
pub const OPT_QUIET: &str = "quiet";

/// Passes run when nothing else is specified.
pub const DEFAULT_PASSES: i64 = 10;

/// Errors raised while reading options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option '{0}'")]
    Unknown(String),

    #[error("option '{name}' holds a {actual} value, expected {expected}")]
    TypeMismatch { name: String, expected: &'static str, actual: &'static str },

    #[error("option '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// Key → value lookup the engine reads its run options from.
pub trait OptionSource {
    fn get_bool(&self, name: &str) -> Result<bool, OptionError>;
    fn get_int(&self, name: &str) -> Result<i64, OptionError>;
}

/// A typed option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
}

impl OptionValue {
    fn type_name(self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RegisteredOption {
    value: OptionValue,
    help: String,
}

/// In-memory option store with registered defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionDatabase {
    options: BTreeMap<String, RegisteredOption>,
}

impl OptionDatabase {
    /// An empty database with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A database with the benchmark's options registered at their defaults.
    pub fn with_defaults() -> Self {
        let mut db = Self::new();
        db.register(OPT_PASSES, OptionValue::Int(DEFAULT_PASSES), "number of measurement passes");
        db.register(OPT_VERBOSE, OptionValue::Bool(false), "print test parameters and timings");
        db.register(OPT_QUIET, OptionValue::Bool(false), "suppress progress output");
        db
    }

    /// Register `name` with a default value, replacing any earlier registration.
    pub fn register(&mut self, name: &str, default: OptionValue, help: &str) {
        self.options
            .insert(name.to_string(), RegisteredOption { value: default, help: help.to_string() });
    }

    /// Set a registered option. The new value must have the registered type.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        let slot = self.options.get_mut(name).ok_or_else(|| OptionError::Unknown(name.into()))?;
        if slot.value.type_name() != value.type_name() {
            return Err(OptionError::TypeMismatch {
                name: name.into(),
                expected: slot.value.type_name(),
                actual: value.type_name(),
            });
        }
        slot.value = value;
        Ok(())
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.options.get(name).map(|o| o.value)
    }

    /// Help text registered for `name`.
    pub fn help(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(|o| o.help.as_str())
    }

    /// `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.value))
    }

    fn lookup(&self, name: &str) -> Result<OptionValue, OptionError> {
        self.get(name).ok_or_else(|| OptionError::Unknown(name.into()))
    }
}

impl OptionSource for OptionDatabase {
    fn get_bool(&self, name: &str) -> Result<bool, OptionError> {
        match self.lookup(name)? {
            OptionValue::Bool(b) => Ok(b),
            other => Err(OptionError::TypeMismatch {
                name: name.into(),
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    fn get_int(&self, name: &str) -> Result<i64, OptionError> {
        match self.lookup(name)? {
            OptionValue::Int(i) => Ok(i),
            other => Err(OptionError::TypeMismatch {
                name: name.into(),
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }
}

/// Run options read once at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Number of measurement passes (≥ 1).
    pub passes: u32,
    /// Report test parameters and per-kernel timings.
    pub verbose: bool,
}

impl RunConfig {
    /// Read `"passes"` and `"verbose"` from `options`.
    ///
    /// # Errors
    ///
    /// A missing option, a type mismatch, or a pass count outside
    /// `1..=u32::MAX` is a configuration error.
    pub fn from_options(options: &dyn OptionSource) -> Result<Self, OptionError> {
        let verbose = options.get_bool(OPT_VERBOSE)?;
        let raw = options.get_int(OPT_PASSES)?;
        let passes = u32::try_from(raw).ok().filter(|&p| p > 0).ok_or_else(|| {
            OptionError::Invalid {
                name: OPT_PASSES.into(),
                reason: format!("must be a positive integer, got {raw}"),
            }
        })?;
        Ok(Self { passes, verbose })
    }
}
