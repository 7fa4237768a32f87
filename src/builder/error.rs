//! Build errors for the state machine builder.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Machine name not specified. Call .name(name) or start from a config")]
    MissingName,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
