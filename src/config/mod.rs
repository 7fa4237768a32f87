//! Machine configuration and its validation.
//!
//! Validation uses Stillwater's `Validation` so that every problem in a
//! configuration is reported at once instead of one per load attempt.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use turnstack::config::MachineConfig;
//!
//! let config = MachineConfig::from_json(
//!     r#"{ "name": "simon", "idle_timeout_ms": 15000 }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.name, "simon");
//! assert_eq!(config.idle_timeout(), Some(Duration::from_secs(15)));
//! assert_eq!(config.history_capacity, 64);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A single problem found in a [`MachineConfig`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("Machine name must not be empty")]
    EmptyName,

    #[error("History capacity must be at least 1 (got {0})")]
    ZeroHistoryCapacity(usize),

    #[error("Idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse machine configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid machine configuration: {}", join_violations(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn default_history_capacity() -> usize {
    crate::core::TransitionHistory::DEFAULT_CAPACITY
}

/// Settings for one state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub name: String,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Default idle window for timeout states, in milliseconds.
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
}

impl MachineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history_capacity: default_history_capacity(),
            idle_timeout_ms: None,
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    /// Check every rule, accumulating ALL violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = vec![
            if self.name.trim().is_empty() {
                Validation::fail(ConfigViolation::EmptyName)
            } else {
                Validation::success(())
            },
            if self.history_capacity == 0 {
                Validation::fail(ConfigViolation::ZeroHistoryCapacity(self.history_capacity))
            } else {
                Validation::success(())
            },
            if self.idle_timeout_ms == Some(0) {
                Validation::fail(ConfigViolation::ZeroIdleTimeout)
            } else {
                Validation::success(())
            },
        ];

        Validation::all_vec(checks).map(|_| ())
    }

    /// `self` if valid, otherwise every violation.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(_) => Ok(self),
            Validation::Failure(errors) => Err(ConfigError::Invalid(errors.iter().cloned().collect())),
        }
    }
}
